//! Local cache persisted next to the client as one JSON file.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use models::CatalogDocument;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::sync::{PendingOp, SyncState};
use crate::ClientResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCache {
    /// Last server document with queued operations applied on top.
    #[serde(default)]
    pub document: CatalogDocument,
    #[serde(default)]
    pub sync: SyncState,
    #[serde(default)]
    pub pending: Vec<PendingOp>,
    /// When `document` was last replaced by a server fetch.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    /// Server message that halted replay.
    #[serde(default)]
    pub conflict: Option<String>,
}

impl LocalCache {
    /// Missing or unreadable cache files start from an empty, never-fetched cache.
    pub async fn load(path: &Path) -> Self {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), err = %e, "cache unreadable, starting empty");
                return Self::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), err = %e, "cache corrupt, starting empty");
                Self::default()
            }
        }
    }

    /// Temp file then rename, same as the server's file store.
    pub async fn save(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache.json".into());
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, &data).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_staleness: Duration) -> bool {
        let Some(fetched_at) = self.fetched_at else {
            return true;
        };
        match chrono::Duration::from_std(max_staleness) {
            Ok(max) => now - fetched_at > max,
            Err(_) => false,
        }
    }

    /// Adopt a fresh server document.
    pub fn replace_document(&mut self, document: CatalogDocument, now: DateTime<Utc>) {
        self.document = document;
        self.fetched_at = Some(now);
    }
}
