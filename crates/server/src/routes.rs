use std::path::Path;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod data;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: catalog API, health, docs, and the
/// optional static front end.
pub fn build_router(state: AppState, cors: CorsLayer, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route(
            "/api/data",
            get(data::list)
                .post(data::create)
                .put(data::update)
                .delete(data::remove)
                .options(data::preflight)
                .fallback(data::endpoint_not_found),
        )
        .route("/health", get(health));

    let docs = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    // 未命中的路径：有前端目录时交给静态资源（SPA 回退到 index.html），否则返回 JSON 404
    let app = match static_dir {
        Some(dir) if dir.is_dir() => {
            let assets = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            api.merge(docs).fallback_service(assets)
        }
        _ => api.merge(docs).fallback(data::endpoint_not_found),
    };

    app.with_state(state)
        .layer(cors)
        // 非预检响应同样带上允许的方法与请求头
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
