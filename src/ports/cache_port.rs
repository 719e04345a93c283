//! Keyed persistent store behind the read-through caches.
//!
//! Stores deal in opaque bytes; encoding lives in
//! [`RecordCache`](crate::domain::record_cache::RecordCache). No TTL, no
//! invalidation beyond explicit `remove`.

use crate::domain::error::TraderError;

pub trait CacheStore {
    fn exists(&self, key: &str) -> Result<bool, TraderError>;

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, TraderError>;

    fn write(&self, key: &str, value: &[u8]) -> Result<(), TraderError>;

    fn remove(&self, key: &str) -> Result<(), TraderError>;
}
