use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Keys missing from `[server]` keep their `Default` value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
    /// Directory with the pre-built front end; served for every non-API path when present.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), static_dir: None }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Kv,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "kv" => Ok(Self::Kv),
            other => Err(anyhow!("unknown storage backend `{other}` (expected `file` or `kv`)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    #[serde(default)]
    pub kv: KvConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::File, data_file: default_data_file(), kv: KvConfig::default() }
    }
}

/// REST credentials of the hosted key-value store.
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_kv_key")]
    pub key: String,
    #[serde(default = "default_kv_timeout")]
    pub timeout_secs: u64,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self { url: String::new(), token: String::new(), key: default_kv_key(), timeout_secs: default_kv_timeout() }
    }
}

fn default_data_file() -> PathBuf { PathBuf::from("data.json") }
fn default_kv_key() -> String { "data".to_string() }
fn default_kv_timeout() -> u64 { 10 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

/// Like [`load_from_file`], but an absent file yields the defaults.
/// Unreadable or malformed files are still errors.
pub fn load_from_file_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => load_from_str(&content).map_err(|e| anyhow!("invalid config file {path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("cannot read config file {path}: {e}")),
    }
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or defaults when it is absent), apply env overrides, validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_from_file_or_default(&config_path())?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment wins over the file. The lookup is injected so tests don't touch process env.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.trim().parse().map_err(|_| anyhow!("SERVER_PORT must be a port number"))?;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.trim().parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }
        if let Some(backend) = lookup("STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(file) = lookup("DATA_FILE") {
            self.storage.data_file = PathBuf::from(file);
        }
        self.storage.kv.normalize_from(&lookup);
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl KvConfig {
    /// Vercel exposes the REST credentials as `KV_REST_API_URL` / `KV_REST_API_TOKEN`.
    fn normalize_from<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.url.trim().is_empty() {
            if let Some(url) = lookup("KV_REST_API_URL") { self.url = url; }
        }
        if self.token.trim().is_empty() {
            if let Some(token) = lookup("KV_REST_API_TOKEN") { self.token = token; }
        }
        if let Some(key) = lookup("KV_KEY") {
            self.key = key;
        }
        self.url = self.url.trim().trim_end_matches('/').to_string();
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            StorageBackend::File => {
                if self.data_file.as_os_str().is_empty() {
                    return Err(anyhow!("storage.data_file must not be empty"));
                }
            }
            StorageBackend::Kv => {
                if self.kv.url.is_empty() {
                    return Err(anyhow!("storage.kv.url is empty; set it in config.toml or KV_REST_API_URL"));
                }
                let lower = self.kv.url.to_lowercase();
                if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                    return Err(anyhow!("storage.kv.url must start with http:// or https://"));
                }
                if self.kv.token.trim().is_empty() {
                    return Err(anyhow!("storage.kv.token is empty; set it in config.toml or KV_REST_API_TOKEN"));
                }
                if self.kv.key.trim().is_empty() {
                    return Err(anyhow!("storage.kv.key must not be empty"));
                }
                if self.kv.timeout_secs == 0 {
                    return Err(anyhow!("storage.kv.timeout_secs must be a positive number of seconds"));
                }
            }
        }
        Ok(())
    }
}
