//! `CatalogClient`: API calls backed by a persisted local cache.
//!
//! While the server is reachable every mutation goes straight through and
//! the cache mirrors the server. When a call fails in transit (or the server
//! answers 5xx) the mutation is applied to the cache, queued, and the client
//! moves to [`SyncState::Pending`]; later mutations queue behind it so the
//! server sees them in order. [`CatalogClient::sync`] replays the queue.

use chrono::Utc;
use models::{
    CatalogDocument, Category, EntityKind, NewCategory, NewProduct, NewSubcategory, Product, RenameSubcategory,
    Subcategory,
};
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::http::HttpClient;
use crate::sync::{self, PendingOp, SyncState};
use crate::{ClientConfig, ClientError, ClientResult};

/// What one operation produced, either on the server or locally.
#[derive(Debug, Clone)]
enum Ack {
    Category(Category),
    Subcategory(Subcategory),
    Product(Product),
    Renamed(Subcategory),
    Deleted { kind: EntityKind, key: Option<String> },
}

impl Ack {
    fn created_key(&self) -> Option<&str> {
        match self {
            Self::Category(c) => Some(&c.key),
            Self::Subcategory(s) => Some(&s.key),
            Self::Product(p) => Some(&p.key),
            Self::Renamed(_) | Self::Deleted { .. } => None,
        }
    }

    fn apply(self, doc: &mut CatalogDocument) {
        match self {
            Self::Category(c) => doc.categories.push(c),
            Self::Subcategory(s) => doc.subcategories.push(s),
            Self::Product(p) => doc.products.push(p),
            Self::Renamed(s) => {
                if let Some(slot) = doc.subcategories.iter_mut().find(|x| x.key == s.key) {
                    *slot = s;
                }
            }
            Self::Deleted { kind, key } => {
                doc.apply_delete(kind, key.as_deref());
            }
        }
    }

    fn unexpected(self) -> ClientError {
        ClientError::InvalidResponse(format!("unexpected acknowledgement {self:?}"))
    }
}

/// The local effect of `op`, computed against the cached document.
fn local_ack(doc: &CatalogDocument, op: &PendingOp) -> ClientResult<Ack> {
    Ok(match op {
        PendingOp::CreateCategory { local_key, input } => Ack::Category(input.clone().into_category(local_key.clone())),
        PendingOp::CreateSubcategory { local_key, input } => {
            Ack::Subcategory(input.clone().into_subcategory(local_key.clone()))
        }
        PendingOp::CreateProduct { local_key, input } => {
            Ack::Product(input.clone().into_product(local_key.clone(), Utc::now()))
        }
        PendingOp::RenameSubcategory { key, name } => {
            let mut sub = doc
                .subcategory(key)
                .cloned()
                .ok_or_else(|| ClientError::NotFound("Subcategory not found".into()))?;
            sub.name = name.trim().to_string();
            Ack::Renamed(sub)
        }
        PendingOp::Delete { kind, key } => Ack::Deleted { kind: *kind, key: key.clone() },
    })
}

pub struct CatalogClient {
    http: HttpClient,
    config: ClientConfig,
    cache: LocalCache,
}

impl CatalogClient {
    /// Build the HTTP client and load whatever cache is on disk. No request is made.
    pub async fn open(config: ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(&config)?;
        let cache = LocalCache::load(&config.cache_path).await;
        info!(
            base_url = %http.base_url(),
            cache = %config.cache_path.display(),
            state = ?cache.sync,
            pending = cache.pending.len(),
            "catalog client opened"
        );
        Ok(Self { http, config, cache })
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.cache.document
    }

    pub fn sync_state(&self) -> SyncState {
        self.cache.sync
    }

    pub fn pending(&self) -> &[PendingOp] {
        &self.cache.pending
    }

    /// Why replay stopped, while in [`SyncState::Conflict`].
    pub fn conflict(&self) -> Option<&str> {
        self.cache.conflict.as_deref()
    }

    async fn persist(&self) -> ClientResult<()> {
        self.cache.save(&self.config.cache_path).await
    }

    fn online(&self) -> bool {
        self.cache.sync == SyncState::Synced && self.cache.pending.is_empty()
    }

    /// Refetch the server document. A non-empty queue is replayed first.
    pub async fn refresh(&mut self) -> ClientResult<SyncState> {
        if !self.cache.pending.is_empty() {
            return self.sync().await;
        }
        let doc = self.http.fetch_document().await?;
        self.cache.replace_document(doc, Utc::now());
        self.cache.sync = SyncState::Synced;
        self.cache.conflict = None;
        self.persist().await?;
        Ok(SyncState::Synced)
    }

    /// Refetch only when the cache is older than `max_staleness` and nothing is queued.
    pub async fn refresh_if_stale(&mut self) -> ClientResult<bool> {
        if !self.cache.pending.is_empty() || !self.cache.is_stale(Utc::now(), self.config.max_staleness) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    async fn send(&self, op: &PendingOp) -> ClientResult<Ack> {
        Ok(match op {
            PendingOp::CreateCategory { input, .. } => Ack::Category(self.http.create_category(input).await?),
            PendingOp::CreateSubcategory { input, .. } => Ack::Subcategory(self.http.create_subcategory(input).await?),
            PendingOp::CreateProduct { input, .. } => Ack::Product(self.http.create_product(input).await?),
            PendingOp::RenameSubcategory { key, name } => {
                let req = RenameSubcategory { key: key.clone(), name: name.clone() };
                Ack::Renamed(self.http.rename_subcategory(&req).await?)
            }
            PendingOp::Delete { kind, key } => {
                self.http.delete(*kind, key.as_deref()).await?;
                Ack::Deleted { kind: *kind, key: key.clone() }
            }
        })
    }

    async fn submit(&mut self, op: PendingOp) -> ClientResult<Ack> {
        if self.online() {
            match self.send(&op).await {
                Ok(ack) => {
                    ack.clone().apply(&mut self.cache.document);
                    self.persist().await?;
                    debug!(op = op.name(), "applied on server");
                    return Ok(ack);
                }
                Err(e) if e.is_transient() => {
                    warn!(op = op.name(), err = %e, "server unavailable, queueing operation");
                }
                Err(e) => return Err(e),
            }
        }

        let ack = local_ack(&self.cache.document, &op)?;
        ack.clone().apply(&mut self.cache.document);
        self.cache.pending.push(op);
        if self.cache.sync == SyncState::Synced {
            self.cache.sync = SyncState::Pending;
        }
        self.persist().await?;
        Ok(ack)
    }

    pub async fn create_category(&mut self, name: &str) -> ClientResult<Category> {
        let op = PendingOp::CreateCategory { local_key: sync::local_key(), input: NewCategory { name: name.into() } };
        match self.submit(op).await? {
            Ack::Category(c) => Ok(c),
            other => Err(other.unexpected()),
        }
    }

    pub async fn create_subcategory(&mut self, name: &str, parent_category: &str) -> ClientResult<Subcategory> {
        let input = NewSubcategory { name: name.into(), parent_category: parent_category.into() };
        let op = PendingOp::CreateSubcategory { local_key: sync::local_key(), input };
        match self.submit(op).await? {
            Ack::Subcategory(s) => Ok(s),
            other => Err(other.unexpected()),
        }
    }

    pub async fn create_product(&mut self, input: NewProduct) -> ClientResult<Product> {
        let op = PendingOp::CreateProduct { local_key: sync::local_key(), input };
        match self.submit(op).await? {
            Ack::Product(p) => Ok(p),
            other => Err(other.unexpected()),
        }
    }

    pub async fn rename_subcategory(&mut self, key: &str, name: &str) -> ClientResult<Subcategory> {
        let op = PendingOp::RenameSubcategory { key: key.into(), name: name.into() };
        match self.submit(op).await? {
            Ack::Renamed(s) => Ok(s),
            other => Err(other.unexpected()),
        }
    }

    /// Category deletes cascade to subcategories only; products keep their references.
    pub async fn delete(&mut self, kind: EntityKind, key: &str) -> ClientResult<()> {
        self.submit(PendingOp::Delete { kind, key: Some(key.into()) }).await?;
        Ok(())
    }

    pub async fn clear_all(&mut self) -> ClientResult<()> {
        self.submit(PendingOp::Delete { kind: EntityKind::All, key: None }).await?;
        Ok(())
    }

    /// Replay queued operations in order, then refetch.
    ///
    /// A transport failure leaves the client pending and returns the error. A
    /// rejection of the head op stops replay in [`SyncState::Conflict`].
    pub async fn sync(&mut self) -> ClientResult<SyncState> {
        if self.cache.sync == SyncState::Conflict {
            return Ok(SyncState::Conflict);
        }

        while let Some(op) = self.cache.pending.first().cloned() {
            match self.send(&op).await {
                Ok(ack) => {
                    self.cache.pending.remove(0);
                    if let (Some(old), Some(new)) = (op.local_key(), ack.created_key()) {
                        self.cache.document.rekey(old, new);
                        for queued in self.cache.pending.iter_mut() {
                            queued.rekey(old, new);
                        }
                    }
                    debug!(op = op.name(), remaining = self.cache.pending.len(), "replayed queued operation");
                    self.persist().await?;
                }
                Err(e) if e.is_rejection() => {
                    warn!(op = op.name(), err = %e, "server rejected queued operation");
                    self.cache.sync = SyncState::Conflict;
                    self.cache.conflict = Some(e.to_string());
                    self.persist().await?;
                    return Ok(SyncState::Conflict);
                }
                Err(e) => {
                    warn!(op = op.name(), err = %e, remaining = self.cache.pending.len(), "replay interrupted");
                    return Err(e);
                }
            }
        }

        self.cache.conflict = None;
        match self.http.fetch_document().await {
            Ok(doc) => self.cache.replace_document(doc, Utc::now()),
            Err(e) => {
                // queue is acknowledged; force the next refresh_if_stale to refetch
                warn!(err = %e, "refetch after replay failed");
                self.cache.fetched_at = None;
            }
        }
        self.cache.sync = SyncState::Synced;
        self.persist().await?;
        info!("catalog cache synced");
        Ok(SyncState::Synced)
    }

    /// Drop every queued operation and adopt the server document.
    pub async fn discard_pending(&mut self) -> ClientResult<()> {
        let doc = self.http.fetch_document().await?;
        let dropped = self.cache.pending.len();
        self.cache.pending.clear();
        self.cache.conflict = None;
        self.cache.replace_document(doc, Utc::now());
        self.cache.sync = SyncState::Synced;
        self.persist().await?;
        info!(dropped, "discarded pending operations");
        Ok(())
    }

    /// Drop the operation the server rejected and resume replay.
    pub async fn skip_conflicting(&mut self) -> ClientResult<SyncState> {
        if self.cache.sync != SyncState::Conflict {
            return Ok(self.cache.sync);
        }
        if !self.cache.pending.is_empty() {
            let op = self.cache.pending.remove(0);
            info!(op = op.name(), "skipping conflicting operation");
        }
        self.cache.conflict = None;
        self.cache.sync = SyncState::Pending;
        self.persist().await?;
        self.sync().await
    }
}
