//! In-memory [`KvStore`] for tests.
//!
//! Records every call so tests can assert on the exact I/O a reconciliation
//! performed, and can inject failures per key or globally.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::KvStore;

/// A call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvCall {
    /// `get(key)`.
    Get(String),
    /// `put(key, _)`.
    Put(String),
    /// `delete(key, recursive)`.
    Delete {
        /// The key.
        key: String,
        /// Whether the delete was recursive.
        recursive: bool,
    },
}

impl KvCall {
    /// Check if this call modifies the store.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Put(_) | Self::Delete { .. })
    }
}

/// A key-value store that keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<KvCall>>,
    failing_keys: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a call.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Read a value without recording a call.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    /// Read a value as UTF-8 without recording a call.
    #[must_use]
    pub fn value_str(&self, key: &str) -> Option<String> {
        self.value(key)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Check if a key exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// A copy of all entries.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.lock().clone()
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<KvCall> {
        self.calls.lock().clone()
    }

    /// Make every operation on `key` fail with `StoreError::Unavailable`.
    pub fn fail_key(&self, key: impl Into<String>) {
        self.failing_keys.lock().insert(key.into());
    }

    /// Make every operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn record(&self, call: KvCall, key: &str) -> Result<()> {
        self.calls.lock().push(call);

        if *self.unavailable.lock() || self.failing_keys.lock().contains(key) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.record(KvCall::Get(key.to_string()), key)?;
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.record(KvCall::Put(key.to_string()), key)?;
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        self.record(
            KvCall::Delete {
                key: key.to_string(),
                recursive,
            },
            key,
        )?;

        let mut entries = self.entries.lock();
        if recursive {
            entries.retain(|k, _| !k.starts_with(key));
        } else {
            entries.remove(key);
        }
        Ok(())
    }
}
