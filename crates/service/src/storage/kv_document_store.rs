use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::KvConfig;
use models::CatalogDocument;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use super::DocumentStore;
use crate::errors::ServiceError;

/// Catalog document kept under a single entry of a hosted key-value store,
/// spoken to over its REST interface (Upstash / Vercel KV flavour):
/// `GET {url}/get/{key}` and `POST {url}/set/{key}`, bearer-token auth.
#[derive(Clone, Debug)]
pub struct KvDocumentStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    key: String,
}

/// Every REST reply is wrapped as `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl KvDocumentStore {
    pub fn new(cfg: &KvConfig) -> Result<Arc<Self>, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(Arc::new(Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            key: cfg.key.clone(),
        }))
    }

    async fn call(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>, ServiceError> {
        let resp = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let status = resp.status();
        let reply: KvReply = resp.json().await.map_err(|e| ServiceError::Storage(format!("kv reply ({status}): {e}")))?;
        if let Some(err) = reply.error {
            return Err(ServiceError::Storage(format!("kv error ({status}): {err}")));
        }
        if !status.is_success() {
            return Err(ServiceError::Storage(format!("kv status {status}")));
        }
        Ok(reply.result)
    }

    async fn fetch(&self) -> Result<CatalogDocument, ServiceError> {
        let url = format!("{}/get/{}", self.base_url, self.key);
        let result = self.call(self.client.get(url)).await?;
        let doc = match result {
            None | Some(Value::Null) => CatalogDocument::default(),
            // stored values come back as the string that was set
            Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|e| ServiceError::Storage(format!("decode kv value: {e}")))?,
            Some(other) => serde_json::from_value(other).map_err(|e| ServiceError::Storage(format!("decode kv value: {e}")))?,
        };
        Ok(doc)
    }

    async fn store(&self, doc: &CatalogDocument) -> Result<(), ServiceError> {
        let url = format!("{}/set/{}", self.base_url, self.key);
        let body = serde_json::to_string(doc).map_err(|e| ServiceError::Storage(e.to_string()))?;
        match self.call(self.client.post(url).body(body)).await? {
            Some(Value::String(ok)) if ok == "OK" => Ok(()),
            other => Err(ServiceError::Storage(format!("unexpected kv set result: {other:?}"))),
        }
    }
}

#[async_trait]
impl DocumentStore for KvDocumentStore {
    async fn read(&self) -> CatalogDocument {
        match self.fetch().await {
            Ok(doc) => {
                debug!(key = %self.key, "catalog document read from kv");
                doc
            }
            Err(e) => {
                error!(key = %self.key, err = %e, "error reading catalog document from kv");
                CatalogDocument::default()
            }
        }
    }

    async fn write(&self, doc: &CatalogDocument) -> bool {
        match self.store(doc).await {
            Ok(()) => {
                debug!(key = %self.key, "catalog document written to kv");
                true
            }
            Err(e) => {
                error!(key = %self.key, err = %e, "error writing catalog document to kv");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("kv:{}/{}", self.base_url, self.key)
    }
}
