//! The key-value blob store the engine persists through.

use std::collections::HashMap;

use thiserror::Error;

/// Boxed source error from a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of the underlying store. Surfaced to callers unchanged; the engine
/// never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {key:?} from store")]
    Read {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to write {key:?} to store")]
    Write {
        key: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn read(key: &str, source: impl Into<BoxError>) -> Self {
        Self::Read {
            key: key.to_string(),
            source: source.into(),
        }
    }

    pub fn write(key: &str, source: impl Into<BoxError>) -> Self {
        Self::Write {
            key: key.to_string(),
            source: source.into(),
        }
    }
}

/// Synchronous get/set of whole serialized documents.
pub trait BlobStore {
    /// Returns `None` if nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: BlobStore + ?Sized> BlobStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Volatile store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// Number of successful `set` calls.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
