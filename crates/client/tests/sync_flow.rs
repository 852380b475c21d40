use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use client::{CatalogClient, ClientConfig, ClientError, SyncState};
use models::{CatalogDocument, EntityKind, NewProduct, PriceInput};
use serde_json::json;
use service::catalog::CatalogService;
use service::storage::JsonDocumentStore;
use tokio::net::TcpListener;
use uuid::Uuid;

use server::{routes, startup, state::AppState};

/// One catalog served twice: through a switchable gate (what the client
/// talks to) and directly (what the test uses to play another user).
struct TestServer {
    gated_url: String,
    direct_url: String,
    online: Arc<AtomicBool>,
    dir: PathBuf,
}

impl TestServer {
    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.gated_url, self.dir.join(format!("cache-{}.json", Uuid::new_v4()))).with_timeout(5)
    }

    async fn server_document(&self) -> anyhow::Result<CatalogDocument> {
        Ok(reqwest::get(format!("{}/api/data", self.direct_url)).await?.json().await?)
    }

    async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.dir).await;
    }
}

async fn gate(State(online): State<Arc<AtomicBool>>, req: Request, next: Next) -> Response {
    if online.load(Ordering::SeqCst) {
        next.run(req).await
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "offline"}))).into_response()
    }
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

async fn start_server() -> anyhow::Result<TestServer> {
    let dir = std::env::temp_dir().join(format!("catalog_client_{}", Uuid::new_v4()));
    let store = JsonDocumentStore::new(dir.join("data.json")).await?;
    let state = AppState::new(CatalogService::new(store));
    let online = Arc::new(AtomicBool::new(true));

    let gated = routes::build_router(state.clone(), startup::build_cors(), None)
        .layer(middleware::from_fn_with_state(online.clone(), gate));
    let direct = routes::build_router(state, startup::build_cors(), None);

    Ok(TestServer { gated_url: serve(gated).await?, direct_url: serve(direct).await?, online, dir })
}

fn tea(category: &str, subcategory: Option<&str>, price: PriceInput) -> NewProduct {
    NewProduct {
        name: "Tea".into(),
        category: category.into(),
        subcategory: subcategory.map(str::to_string),
        description: "green".into(),
        price,
        images: None,
    }
}

#[tokio::test]
async fn online_mutations_stay_synced() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let mut client = CatalogClient::open(srv.config()).await?;
    assert_eq!(client.refresh().await?, SyncState::Synced);

    let cat = client.create_category(" Drinks ").await?;
    assert!(!client::sync::is_local_key(&cat.key));
    assert_eq!(cat.name, "Drinks");
    let sub = client.create_subcategory("Hot", &cat.key).await?;
    client.create_product(tea(&cat.key, Some(&sub.key), PriceInput::Text("3.5".into()))).await?;
    let renamed = client.rename_subcategory(&sub.key, "Iced").await?;
    assert_eq!(renamed.name, "Iced");

    assert_eq!(client.sync_state(), SyncState::Synced);
    assert!(client.pending().is_empty());
    assert_eq!(client.document(), &srv.server_document().await?);

    // rejection while online is surfaced and nothing is queued
    let err = client.rename_subcategory("missing", "x").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(client.sync_state(), SyncState::Synced);

    client.delete(EntityKind::Category, &cat.key).await?;
    let doc = srv.server_document().await?;
    assert!(doc.subcategories.is_empty());
    assert_eq!(doc.products.len(), 1);
    assert_eq!(client.document(), &doc);

    srv.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn offline_changes_queue_and_replay_in_order() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let config = srv.config();
    let mut client = CatalogClient::open(config.clone()).await?;
    client.refresh().await?;

    srv.set_online(false);
    let cat = client.create_category("Drinks").await?;
    assert!(client::sync::is_local_key(&cat.key));
    assert_eq!(client.sync_state(), SyncState::Pending);
    let sub = client.create_subcategory("Hot", &cat.key).await?;
    let product = client.create_product(tea(&cat.key, Some(&sub.key), PriceInput::Number(2.0))).await?;
    assert_eq!(product.category, cat.key);
    assert_eq!(client.pending().len(), 3);
    assert_eq!(client.document().products.len(), 1);

    // the queue survives a restart
    drop(client);
    let mut client = CatalogClient::open(config).await?;
    assert_eq!(client.sync_state(), SyncState::Pending);
    assert_eq!(client.pending().len(), 3);

    // still offline: replay fails in transit and nothing is lost
    let err = client.sync().await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(client.sync_state(), SyncState::Pending);
    assert_eq!(client.pending().len(), 3);
    assert!(!client.refresh_if_stale().await?);

    srv.set_online(true);
    assert_eq!(client.sync().await?, SyncState::Synced);
    assert!(client.pending().is_empty());

    let doc = srv.server_document().await?;
    assert_eq!(client.document(), &doc);
    assert_eq!(doc.categories.len(), 1);
    let server_cat = &doc.categories[0].key;
    assert!(!client::sync::is_local_key(server_cat));
    assert_eq!(&doc.subcategories[0].parent_category, server_cat);
    assert_eq!(&doc.products[0].category, server_cat);
    assert_eq!(doc.products[0].subcategory, doc.subcategories[0].key);

    srv.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn rejected_replay_moves_to_conflict_and_can_be_skipped() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let mut client = CatalogClient::open(srv.config()).await?;
    let sub = client.create_subcategory("Hot", "1").await?;

    srv.set_online(false);
    client.rename_subcategory(&sub.key, "Iced").await?;
    client.create_category("Later").await?;
    assert_eq!(client.pending().len(), 2);

    // someone else removes the subcategory meanwhile
    let res = reqwest::Client::new()
        .delete(format!("{}/api/data", srv.direct_url))
        .query(&[("type", "subcategory"), ("key", sub.key.as_str())])
        .send()
        .await?;
    assert!(res.status().is_success());

    srv.set_online(true);
    assert_eq!(client.sync().await?, SyncState::Conflict);
    assert!(client.conflict().is_some_and(|m| m.contains("Subcategory not found")));
    assert_eq!(client.pending().len(), 2);
    // conflict holds until resolved
    assert_eq!(client.sync().await?, SyncState::Conflict);

    assert_eq!(client.skip_conflicting().await?, SyncState::Synced);
    assert!(client.conflict().is_none());
    let doc = srv.server_document().await?;
    assert_eq!(client.document(), &doc);
    assert!(doc.subcategories.is_empty());
    assert_eq!(doc.categories[0].name, "Later");

    srv.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn discard_pending_adopts_server_document() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let mut client = CatalogClient::open(srv.config()).await?;
    client.create_category("Kept").await?;

    srv.set_online(false);
    client.create_category("Ghost").await?;
    client.clear_all().await?;
    assert!(client.document().categories.is_empty());
    assert_eq!(client.pending().len(), 2);

    srv.set_online(true);
    client.discard_pending().await?;
    assert_eq!(client.sync_state(), SyncState::Synced);
    assert!(client.pending().is_empty());
    let names: Vec<_> = client.document().categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Kept"]);

    srv.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn refresh_if_stale_respects_window() -> anyhow::Result<()> {
    let srv = start_server().await?;
    let mut client = CatalogClient::open(srv.config().with_max_staleness(Duration::from_secs(3600))).await?;
    assert!(client.refresh_if_stale().await?, "never fetched counts as stale");

    reqwest::Client::new()
        .post(format!("{}/api/data", srv.direct_url))
        .json(&json!({"type": "category", "name": "Elsewhere"}))
        .send()
        .await?;
    assert!(!client.refresh_if_stale().await?);
    assert!(client.document().categories.is_empty());

    let mut eager = CatalogClient::open(srv.config().with_max_staleness(Duration::ZERO)).await?;
    eager.refresh().await?;
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(eager.refresh_if_stale().await?);
    assert_eq!(eager.document().categories.len(), 1);

    srv.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_server_and_bad_input() -> anyhow::Result<()> {
    // a port nobody listens on
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let dir = std::env::temp_dir().join(format!("catalog_client_{}", Uuid::new_v4()));
    let config = ClientConfig::new(format!("http://{addr}/"), dir.join("cache.json")).with_timeout(2);
    let mut client = CatalogClient::open(config).await?;

    // a loose price is read up to its numeric prefix and queued like any other
    let product = client.create_product(tea("1", None, PriceInput::Text("12.5abc".into()))).await?;
    assert_eq!(product.price, 12.5);
    assert_eq!(client.pending().len(), 1);

    client.create_category("Drinks").await?;
    assert_eq!(client.sync_state(), SyncState::Pending);
    assert_eq!(client.pending().len(), 2);

    // renaming something the cache has never seen is refused locally
    let err = client.rename_subcategory("nope", "x").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(client.pending().len(), 2);

    let _ = tokio::fs::remove_dir_all(&dir).await;
    Ok(())
}
