//! Offline queue: operations applied to the local cache that the server has
//! not acknowledged yet.

use models::{EntityKind, NewCategory, NewProduct, NewSubcategory};
use serde::{Deserialize, Serialize};

/// Prefix of keys minted on the client for entities the server has not seen.
pub const LOCAL_KEY_PREFIX: &str = "local-";

pub fn local_key() -> String {
    format!("{LOCAL_KEY_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

pub fn is_local_key(key: &str) -> bool {
    key.starts_with(LOCAL_KEY_PREFIX)
}

/// Where the cache stands relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Cache mirrors the last server document and the queue is empty.
    #[default]
    Synced,
    /// At least one queued operation is waiting for the server.
    Pending,
    /// The server refused the head of the queue; replay is halted.
    Conflict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PendingOp {
    CreateCategory { local_key: String, input: NewCategory },
    CreateSubcategory { local_key: String, input: NewSubcategory },
    CreateProduct { local_key: String, input: NewProduct },
    Delete { kind: EntityKind, key: Option<String> },
    RenameSubcategory { key: String, name: String },
}

fn swap(slot: &mut String, old: &str, new: &str) {
    if slot == old {
        *slot = new.to_string();
    }
}

impl PendingOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCategory { .. } => "create_category",
            Self::CreateSubcategory { .. } => "create_subcategory",
            Self::CreateProduct { .. } => "create_product",
            Self::Delete { .. } => "delete",
            Self::RenameSubcategory { .. } => "rename_subcategory",
        }
    }

    /// Key this op introduces, for creates.
    pub fn local_key(&self) -> Option<&str> {
        match self {
            Self::CreateCategory { local_key, .. }
            | Self::CreateSubcategory { local_key, .. }
            | Self::CreateProduct { local_key, .. } => Some(local_key),
            _ => None,
        }
    }

    /// Rewrites every reference to `old` once the server assigned `new`.
    pub fn rekey(&mut self, old: &str, new: &str) {
        match self {
            Self::CreateCategory { local_key, .. } => swap(local_key, old, new),
            Self::CreateSubcategory { local_key, input } => {
                swap(local_key, old, new);
                swap(&mut input.parent_category, old, new);
            }
            Self::CreateProduct { local_key, input } => {
                swap(local_key, old, new);
                swap(&mut input.category, old, new);
                if let Some(sub) = input.subcategory.as_mut() {
                    swap(sub, old, new);
                }
            }
            Self::Delete { key, .. } => {
                if let Some(key) = key.as_mut() {
                    swap(key, old, new);
                }
            }
            Self::RenameSubcategory { key, .. } => swap(key, old, new),
        }
    }
}
