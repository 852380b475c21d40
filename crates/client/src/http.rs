//! HTTP client for the `/api/data` endpoint

use std::time::Duration;

use models::{
    CatalogDocument, Category, EntityKind, NewCategory, NewProduct, NewSubcategory, Product, RenameSubcategory,
    Subcategory,
};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{ClientConfig, ClientError, ClientResult};

const DATA_PATH: &str = "api/data";

/// Request body: the payload plus the `type` discriminator the server dispatches on.
#[derive(Serialize)]
struct Typed<'a, T> {
    #[serde(rename = "type")]
    kind: EntityKind,
    #[serde(flatten)]
    body: &'a T,
}

/// `{"success": true, "<type>": {...}}`
#[derive(Deserialize)]
struct Entity<T> {
    #[serde(alias = "category", alias = "subcategory", alias = "product")]
    entity: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin typed wrapper over the catalog API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout)).build()?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, DATA_PATH)
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ErrorBody>(&text).map(|b| b.error).unwrap_or(text);
            return Err(match status {
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                s if s.is_client_error() => ClientError::Rejected { status: s, message },
                s => ClientError::Server { status: s, message },
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn send_typed<T, B>(&self, method: reqwest::Method, kind: EntityKind, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = self
            .client
            .request(method, self.url())
            .json(&Typed { kind, body })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// The whole catalog document
    pub async fn fetch_document(&self) -> ClientResult<CatalogDocument> {
        let response = self.client.get(self.url()).send().await?;
        Self::handle_response(response).await
    }

    pub async fn create_category(&self, input: &NewCategory) -> ClientResult<Category> {
        let created: Entity<Category> =
            self.send_typed(reqwest::Method::POST, EntityKind::Category, input).await?;
        Ok(created.entity)
    }

    pub async fn create_subcategory(&self, input: &NewSubcategory) -> ClientResult<Subcategory> {
        let created: Entity<Subcategory> =
            self.send_typed(reqwest::Method::POST, EntityKind::Subcategory, input).await?;
        Ok(created.entity)
    }

    pub async fn create_product(&self, input: &NewProduct) -> ClientResult<Product> {
        let created: Entity<Product> = self.send_typed(reqwest::Method::POST, EntityKind::Product, input).await?;
        Ok(created.entity)
    }

    pub async fn rename_subcategory(&self, input: &RenameSubcategory) -> ClientResult<Subcategory> {
        let renamed: Entity<Subcategory> =
            self.send_typed(reqwest::Method::PUT, EntityKind::Subcategory, input).await?;
        Ok(renamed.entity)
    }

    /// `DELETE /api/data?type=..&key=..`; `key` is ignored for `all`.
    pub async fn delete(&self, kind: EntityKind, key: Option<&str>) -> ClientResult<()> {
        let mut query = vec![("type", kind.as_str())];
        if let Some(key) = key {
            query.push(("key", key));
        }
        let response = self.client.delete(self.url()).query(&query).send().await?;
        Self::handle_response::<serde_json::Value>(response).await?;
        Ok(())
    }
}
