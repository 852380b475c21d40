//! Service layer for the catalog.
//! - `storage`: where the single catalog document lives (local file or hosted KV).
//! - `catalog`: the read-modify-write operations behind the HTTP API.

pub mod errors;
pub mod runtime;
pub mod storage;
pub mod catalog;
#[cfg(test)]
pub mod test_support;
