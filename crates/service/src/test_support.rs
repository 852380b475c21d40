#![cfg(test)]
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use models::CatalogDocument;
use tokio::sync::Mutex;

use crate::storage::DocumentStore;

/// Unique scratch path under the system temp dir.
pub fn temp_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}.json", uuid::Uuid::new_v4()))
}

/// Serves a fixed document and refuses every write.
pub struct ReadOnlyStore {
    pub doc: CatalogDocument,
    pub write_attempts: Mutex<usize>,
}

impl ReadOnlyStore {
    pub fn new(doc: CatalogDocument) -> Arc<Self> {
        Arc::new(Self { doc, write_attempts: Mutex::new(0) })
    }
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn read(&self) -> CatalogDocument { self.doc.clone() }

    async fn write(&self, _doc: &CatalogDocument) -> bool {
        *self.write_attempts.lock().await += 1;
        false
    }

    fn describe(&self) -> String { "read-only".into() }
}
