//! Storage abstractions for the catalog document.
//!
//! The whole catalog is one JSON document. Backends only ever read it whole
//! and replace it whole; neither call surfaces an error to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{StorageBackend, StorageConfig};
use models::CatalogDocument;
use tracing::info;

use crate::errors::ServiceError;

pub mod json_document_store;
pub mod kv_document_store;

pub use json_document_store::JsonDocumentStore;
pub use kv_document_store::KvDocumentStore;

/// Backend holding the persisted catalog document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The persisted document, or an empty one when nothing is stored or it can't be decoded.
    async fn read(&self) -> CatalogDocument;
    /// Replace the persisted document; `false` when the backend could not take it.
    async fn write(&self, doc: &CatalogDocument) -> bool;
    /// Human readable location, used in logs.
    fn describe(&self) -> String;
}

/// Build the backend selected in configuration.
pub async fn open_store(cfg: &StorageConfig) -> Result<Arc<dyn DocumentStore>, ServiceError> {
    let store: Arc<dyn DocumentStore> = match cfg.backend {
        StorageBackend::File => JsonDocumentStore::new(&cfg.data_file).await?,
        StorageBackend::Kv => KvDocumentStore::new(&cfg.kv)?,
    };
    info!(backend = ?cfg.backend, location = %store.describe(), "catalog store ready");
    Ok(store)
}
