//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the data file's directory exists; warn when the optional static directory is missing.
pub async fn ensure_env(static_dir: Option<&Path>, data_file: &Path) -> anyhow::Result<()> {
    if let Some(dir) = static_dir {
        if tokio::fs::metadata(dir).await.is_err() {
            warn!(static_dir = %dir.display(), "static assets directory not found; only the API will be served");
        }
    }
    if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    }
    Ok(())
}
