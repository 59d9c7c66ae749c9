//! Key-value storage abstraction.
//!
//! Session state, ratings, counters and response caches all go through the
//! `KvStore` trait instead of ambient global storage, so every consumer can
//! be exercised against an in-memory store in tests.

mod cache;
mod file;
mod memory;

pub use cache::TtlCache;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (file store only).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored blob could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A minimal string key-value store over namespaced keys.
///
/// Keys are dot-namespaced by convention (`auth.session_id`, `ratings.v1`,
/// `cache.top-premiere`). Values are opaque strings; callers that need
/// structure store JSON.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
