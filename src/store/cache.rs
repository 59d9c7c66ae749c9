//! TTL cache over a `KvStore`.
//!
//! Values are stored as a JSON envelope carrying the write timestamp; reads
//! older than the caller's max age count as misses. Cache failures are never
//! fatal: a broken entry is logged and treated as absent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::KvStore;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    cached_at: DateTime<Utc>,
    data: T,
}

/// Read-through cache wrapper. Cloning shares the underlying store.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KvStore>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Fetch a cached value if it exists and is younger than `max_age`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(env) => env,
            Err(e) => {
                debug!("Cache entry for {} is unreadable, discarding: {}", key, e);
                let _ = self.store.remove(key);
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(envelope.cached_at);
        match age.to_std() {
            Ok(age) if age < max_age => Some(envelope.data),
            // Expired, or cached_at lies in the future (clock skew): miss.
            _ => None,
        }
    }

    /// Store a value with the current timestamp. Failures are logged, not
    /// propagated; the cache is best-effort by contract.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let envelope = Envelope {
            cached_at: Utc::now(),
            data: value,
        };
        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, &raw) {
                    debug!("Cache write failed for {}: {}", key, e);
                }
            }
            Err(e) => debug!("Cache serialization failed for {}: {}", key, e),
        }
    }

    /// Drop a cached entry.
    pub fn invalidate(&self, key: &str) {
        let _ = self.store.remove(key);
    }
}
