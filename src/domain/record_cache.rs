//! Read-through cache over a [`CacheStore`], typed by key and record.
//!
//! Records are encoded with bincode. An entry that fails to decode (corrupt
//! file, schema change) is evicted and treated as a miss, so the caller
//! refetches instead of failing.

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::domain::error::TraderError;
use crate::ports::cache_port::CacheStore;

/// Maps a typed key to the string the store is addressed by.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

pub struct RecordCache<'a, K, R> {
    store: &'a dyn CacheStore,
    _marker: PhantomData<fn(&K) -> R>,
}

impl<'a, K, R> RecordCache<'a, K, R>
where
    K: CacheKey,
    R: Serialize + DeserializeOwned,
{
    pub fn new(store: &'a dyn CacheStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn contains(&self, key: &K) -> Result<bool, TraderError> {
        self.store.exists(&key.cache_key())
    }

    pub fn get(&self, key: &K) -> Result<Option<R>, TraderError> {
        let key = key.cache_key();
        let Some(bytes) = self.store.read(&key)? else {
            return Ok(None);
        };
        match bincode::deserialize::<R>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("evicting unreadable cache entry {}: {}", key, e);
                self.store.remove(&key).map_err(|evict_err| TraderError::Decode {
                    key: key.clone(),
                    reason: format!("{e}; eviction failed: {evict_err}"),
                })?;
                Ok(None)
            }
        }
    }

    pub fn put(&self, key: &K, record: &R) -> Result<(), TraderError> {
        let key = key.cache_key();
        let bytes = bincode::serialize(record).map_err(|e| TraderError::CacheStore {
            reason: format!("failed to encode {key}: {e}"),
        })?;
        self.store.write(&key, &bytes)
    }

    /// Return the cached record for `key`, or run `fetch` and persist what it finds.
    ///
    /// `Ok(None)` from `fetch` means "no data" and is not persisted.
    pub fn get_or_fetch<F>(&self, key: &K, fetch: F) -> Result<Option<R>, TraderError>
    where
        F: FnOnce() -> Result<Option<R>, TraderError>,
    {
        if let Some(record) = self.get(key)? {
            debug!("cache hit {}", key.cache_key());
            return Ok(Some(record));
        }
        debug!("cache miss {}", key.cache_key());

        let fetched = fetch()?;
        if let Some(record) = &fetched {
            self.put(key, record)?;
        }
        Ok(fetched)
    }
}
