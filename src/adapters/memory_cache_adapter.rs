//! In-process cache store. Nothing survives the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::error::TraderError;
use crate::ports::cache_port::CacheStore;

#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, TraderError> {
        self.entries.lock().map_err(|_| TraderError::CacheStore {
            reason: "memory cache lock poisoned".to_string(),
        })
    }
}

impl CacheStore for MemoryCacheStore {
    fn exists(&self, key: &str) -> Result<bool, TraderError> {
        Ok(self.lock()?.contains_key(key))
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, TraderError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), TraderError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TraderError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
