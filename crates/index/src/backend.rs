use crate::IndexError;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Key-value storage partitioned into named collections.
/// This allows for different storage implementations (e.g., in-memory, Redb).
pub trait IndexBackend: Send + Sync {
    /// Insert or update a key-value pair inside `collection`.
    fn put(&self, collection: &str, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Retrieve a value by key. A collection that was never written reads as empty.
    fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Visit every value of `collection` in key order.
    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError>;
    /// Flush any buffered writes to the backend.
    fn flush(&self) -> Result<(), IndexError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb (pure Rust, persistent)
/// let config = BackendConfig::redb("/data/outfit.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BackendConfig {
    /// Redb database file at `path`. Requires the `backend-redb` feature (on by default).
    Redb { path: String },
    /// Process-local maps. Contents vanish on drop.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the backend based on the configuration.
    pub fn build(&self) -> Result<Box<dyn IndexBackend>, IndexError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(IndexError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

type Collections = HashMap<String, BTreeMap<String, Vec<u8>>>;

/// An in-memory backend: one ordered map per collection behind a `RwLock`.
#[derive(Default)]
pub struct InMemoryBackend {
    collections: RwLock<Collections>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexBackend for InMemoryBackend {
    fn put(&self, collection: &str, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.collections
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        Ok(guard
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn scan(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        if let Some(records) = guard.get(collection) {
            for value in records.values() {
                visitor(value)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbBackend;
