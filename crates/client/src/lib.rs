//! Catalog client
//!
//! Typed access to `/api/data` with a local cache that keeps working while
//! the server is unreachable and replays queued changes once it is back.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod sync;

pub use cache::LocalCache;
pub use client::CatalogClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use sync::{PendingOp, SyncState};
