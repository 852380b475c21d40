use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::CatalogDocument;
use tokio::fs;
use tracing::{debug, error};

use super::DocumentStore;
use crate::errors::ServiceError;

/// Catalog document kept in a local JSON file.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a reader sees either the old or the new document.
#[derive(Clone, Debug)]
pub struct JsonDocumentStore {
    file_path: PathBuf,
}

impl JsonDocumentStore {
    /// Initialize the store from a path. Creates the file with an empty document if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = Self { file_path: path.into() };
        store.initialize().await?;
        Ok(Arc::new(store))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }

    async fn initialize(&self) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        if fs::metadata(&self.file_path).await.is_err() {
            self.save(&CatalogDocument::default()).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<CatalogDocument, ServiceError> {
        self.initialize().await?;
        let bytes = fs::read(&self.file_path).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Storage(format!("decode {}: {e}", self.file_path.display())))
    }

    async fn save(&self, doc: &CatalogDocument) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(doc).map_err(|e| ServiceError::Storage(e.to_string()))?;
        let file_name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data.json".into());
        let tmp = self.file_path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, &data).await {
            return Err(ServiceError::Storage(format!("write {}: {e}", tmp.display())));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::Storage(format!("replace {}: {e}", self.file_path.display())));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn read(&self) -> CatalogDocument {
        match self.load().await {
            Ok(doc) => {
                debug!(path = %self.file_path.display(), "catalog document read");
                doc
            }
            Err(e) => {
                error!(path = %self.file_path.display(), err = %e, "error reading catalog document");
                CatalogDocument::default()
            }
        }
    }

    async fn write(&self, doc: &CatalogDocument) -> bool {
        match self.save(doc).await {
            Ok(()) => {
                debug!(path = %self.file_path.display(), "catalog document written");
                true
            }
            Err(e) => {
                error!(path = %self.file_path.display(), err = %e, "error writing catalog document");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("file:{}", self.file_path.display())
    }
}
