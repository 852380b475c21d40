//! `/api/data`: the one catalog endpoint. The HTTP method picks the
//! operation, the `type` field picks the collection.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use models::{CatalogDocument, EntityKind, NewCategory, NewProduct, NewSubcategory, RenameSubcategory};
use serde::Deserialize;
use serde_json::{json, Value};
use service::errors::ServiceError;
use tracing::debug;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Reserved; a GET carrying a non-empty `action` is not served here.
    pub action: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// `category`, `subcategory`, `product` or `all`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub key: Option<String>,
}

/// Decode a JSON body and read its `type` discriminator.
fn parse_body(body: &Bytes) -> Result<(Option<EntityKind>, Value), JsonApiError> {
    let value: Value = serde_json::from_slice(body).map_err(JsonApiError::internal)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<EntityKind>().ok());
    Ok((kind, value))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, JsonApiError> {
    serde_json::from_value(value).map_err(JsonApiError::internal)
}

/// Storage failures carry an operation specific message; the rest are generic 500s.
fn service_error(err: ServiceError, save_failed: &str) -> JsonApiError {
    match err {
        ServiceError::Storage(_) => JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, save_failed),
        other => JsonApiError::internal(other),
    }
}

#[utoipa::path(
    get, path = "/api/data", tag = "catalog",
    params(ListQuery),
    responses(
        (status = 200, description = "Whole catalog document", body = crate::openapi::CatalogDocumentDoc),
        (status = 404, description = "Endpoint not found")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CatalogDocument>, JsonApiError> {
    let Query(q) = query.map_err(JsonApiError::internal)?;
    if q.action.as_deref().is_some_and(|a| !a.is_empty()) {
        return Err(JsonApiError::endpoint_not_found());
    }
    Ok(Json(state.catalog.document().await))
}

#[utoipa::path(
    post, path = "/api/data", tag = "catalog",
    request_body = crate::openapi::CreateRequestDoc,
    responses(
        (status = 200, description = "Created; the entity is returned under its type name"),
        (status = 404, description = "Endpoint not found"),
        (status = 500, description = "Save failed or invalid payload")
    )
)]
pub async fn create(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, JsonApiError> {
    let (kind, value) = parse_body(&body)?;
    let catalog = &state.catalog;
    match kind {
        Some(EntityKind::Category) => {
            let input: NewCategory = decode(value)?;
            let category = catalog
                .create_category(input)
                .await
                .map_err(|e| service_error(e, "Failed to save category"))?;
            Ok(Json(json!({"success": true, "category": category})))
        }
        Some(EntityKind::Subcategory) => {
            let input: NewSubcategory = decode(value)?;
            let subcategory = catalog
                .create_subcategory(input)
                .await
                .map_err(|e| service_error(e, "Failed to save subcategory"))?;
            Ok(Json(json!({"success": true, "subcategory": subcategory})))
        }
        Some(EntityKind::Product) => {
            let input: NewProduct = decode(value)?;
            let product = catalog
                .create_product(input)
                .await
                .map_err(|e| service_error(e, "Failed to save product"))?;
            Ok(Json(json!({"success": true, "product": product})))
        }
        Some(EntityKind::All) | None => {
            debug!(kind = ?value.get("type"), "create with unsupported type");
            Err(JsonApiError::endpoint_not_found())
        }
    }
}

#[utoipa::path(
    delete, path = "/api/data", tag = "catalog",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Deleted (also when nothing matched)"),
        (status = 500, description = "Failed to delete")
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Query(q) = query.map_err(JsonApiError::internal)?;
    let kind = q.kind.as_deref().and_then(|t| t.parse::<EntityKind>().ok());
    state
        .catalog
        .delete(kind, q.key.as_deref())
        .await
        .map_err(|e| service_error(e, "Failed to delete"))?;
    Ok(Json(json!({"success": true})))
}

#[utoipa::path(
    put, path = "/api/data", tag = "catalog",
    request_body = crate::openapi::RenameRequestDoc,
    responses(
        (status = 200, description = "Renamed subcategory"),
        (status = 404, description = "Subcategory not found / endpoint not found"),
        (status = 500, description = "Failed to update subcategory")
    )
)]
pub async fn update(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, JsonApiError> {
    let (kind, value) = parse_body(&body)?;
    if kind != Some(EntityKind::Subcategory) {
        return Err(JsonApiError::endpoint_not_found());
    }
    let input: RenameSubcategory = decode(value)?;
    match state.catalog.rename_subcategory(input).await {
        Ok(subcategory) => Ok(Json(json!({"success": true, "subcategory": subcategory}))),
        Err(ServiceError::NotFound(_)) => Err(JsonApiError::not_found("Subcategory not found")),
        Err(e) => Err(service_error(e, "Failed to update subcategory")),
    }
}

/// Plain OPTIONS (CORS preflights are answered by the CORS layer before reaching here).
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn endpoint_not_found() -> JsonApiError {
    JsonApiError::endpoint_not_found()
}
