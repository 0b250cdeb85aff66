//! # Outfit Index
//!
//! Named collections of garment items, each item an `(id, vector, payload)`
//! triple, with exact cosine-similarity queries restricted by payload filters.
//! Two collections are in play in practice, the user's `wardrobe` and the
//! third-party `marketplace`; they are structurally identical and an id is only
//! unique inside its own collection.
//!
//! ## Core Features
//!
//! - **Pluggable Backends**: storage goes through the [`IndexBackend`] trait.
//!   - An in-memory backend for tests and throwaway sessions.
//!   - A redb backend for persistent, on-disk storage (`backend-redb` feature, on by default).
//! - **Compact records**: items are encoded with bincode and compressed with
//!   Zstd (configurable through [`CompressionConfig`]) before they hit the backend.
//! - **Dimension guard**: a collection pins the dimensionality of its first
//!   vector. Later upserts or queries with another length fail with
//!   [`IndexError::DimensionMismatch`] instead of producing meaningless scores.
//!
//! ## Example Usage
//!
//! ```
//! use index::{
//!     Category, CollectionIndex, IndexConfig, Item, ItemId, Payload, PayloadFilter, VectorStore,
//! };
//!
//! let index = CollectionIndex::new(IndexConfig::new()).unwrap();
//!
//! let shirt = Item::new(
//!     ItemId::from("shirt-1"),
//!     vec![1.0, 0.0],
//!     Payload::garment("img/shirt.jpg", Category::Top),
//! );
//! index.upsert("wardrobe", shirt).unwrap();
//!
//! let hits = index
//!     .query("wardrobe", &[1.0, 0.0], &PayloadFilter::category(Category::Top), 5)
//!     .unwrap();
//! assert_eq!(hits[0].item.id.as_str(), "shirt-1");
//! ```

mod backend;
mod query;
mod types;

#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use backend::{BackendConfig, InMemoryBackend, IndexBackend};
pub use types::{Category, Item, ItemId, ParseCategoryError, Payload, PayloadFilter, ScoredItem};

use std::collections::HashMap;
use std::sync::RwLock;

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::{decode_all, encode_all};

/// Bump this value whenever the on-disk record layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

mod payload_serde {
    use serde::de::Error as DeError;
    use serde::ser::Error as SerError;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::Payload;

    // bincode cannot drive `serde_json::Value` directly, so the payload travels
    // as an embedded JSON document.
    pub(super) fn serialize<S>(value: &Payload, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = serde_json::to_vec(value).map_err(SerError::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Payload, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        serde_json::from_slice(&bytes).map_err(DeError::custom)
    }
}

/// On-disk form of an [`Item`].
#[derive(Serialize, Deserialize, Clone, Debug)]
struct StoredItem {
    schema_version: u16,
    id: ItemId,
    vector: Vec<f32>,
    #[serde(with = "payload_serde")]
    payload: Payload,
}

impl From<StoredItem> for Item {
    fn from(stored: StoredItem) -> Self {
        Item::new(stored.id, stored.vector, stored.payload)
    }
}

/// Compression codec options for index storage.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd, where higher = better compression but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }
}

/// Config for initializing the index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexConfig {
    /// Backend storage configuration (in-memory or redb).
    pub backend: BackendConfig,
    /// Compression settings for stored records.
    pub compression: CompressionConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }
}

/// Errors produced by the collection store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Zstd(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Collection-addressed vector store.
///
/// Implementations must tolerate concurrent readers; a single store is shared
/// by every request.
pub trait VectorStore: Send + Sync {
    /// Insert or replace the item with the same id in `collection`.
    fn upsert(&self, collection: &str, item: Item) -> Result<(), IndexError>;

    /// Fetch one item by id, `None` when the collection has no such id.
    fn retrieve(&self, collection: &str, id: &ItemId) -> Result<Option<Item>, IndexError>;

    /// Up to `limit` items of the collection, in storage order.
    fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<Item>, IndexError>;

    /// Up to `limit` items matching `filter`, most similar to `vector` first.
    fn query(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredItem>, IndexError>;
}

/// The shipped [`VectorStore`]: encoded items on top of an [`IndexBackend`].
pub struct CollectionIndex {
    backend: Box<dyn IndexBackend>,
    cfg: IndexConfig,
    /// Pinned dimensionality per collection, filled lazily.
    dimensions: RwLock<HashMap<String, usize>>,
}

impl CollectionIndex {
    /// Initialize or open an index using the configured backend.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        let backend = cfg.backend.build()?;
        Ok(Self::with_backend(cfg, backend))
    }

    /// Build an index with a custom backend (e.g., in-memory for tests).
    pub fn with_backend(cfg: IndexConfig, backend: Box<dyn IndexBackend>) -> Self {
        Self {
            backend,
            cfg,
            dimensions: RwLock::new(HashMap::new()),
        }
    }

    /// Flush backend buffers if supported.
    pub fn flush(&self) -> Result<(), IndexError> {
        self.backend.flush()
    }

    /// Dimensionality pinned for `collection`, `None` while it is empty.
    pub fn dimension(&self, collection: &str) -> Result<Option<usize>, IndexError> {
        if let Some(dim) = self
            .dimensions
            .read()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .get(collection)
        {
            return Ok(Some(*dim));
        }

        // Collections reopened from disk learn their dimension from the first record.
        let mut found = None;
        self.scan_items(collection, &mut |item| {
            if found.is_none() {
                found = Some(item.vector.len());
            }
            Ok(())
        })?;
        if let Some(dim) = found {
            self.pin_dimension(collection, dim)?;
        }
        Ok(found)
    }

    fn pin_dimension(&self, collection: &str, dim: usize) -> Result<(), IndexError> {
        self.dimensions
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?
            .entry(collection.to_string())
            .or_insert(dim);
        Ok(())
    }

    /// Reject vectors that would make cosine scores meaningless.
    pub(crate) fn check_vector(collection: &str, vector: &[f32]) -> Result<(), IndexError> {
        if collection.trim().is_empty() {
            return Err(IndexError::InvalidInput(
                "collection name must not be empty".into(),
            ));
        }
        if vector.is_empty() {
            return Err(IndexError::InvalidInput("vector must not be empty".into()));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidInput(
                "vector contains non-finite values".into(),
            ));
        }
        if vector.iter().all(|v| *v == 0.0) {
            return Err(IndexError::InvalidInput("vector has zero norm".into()));
        }
        Ok(())
    }

    /// Decode every item of `collection` and hand it to the visitor.
    pub(crate) fn scan_items(
        &self,
        collection: &str,
        visitor: &mut dyn FnMut(Item) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        self.backend.scan(collection, &mut |data: &[u8]| {
            let stored = self.decode_record(data)?;
            visitor(stored.into())
        })
    }

    fn decode_record(&self, data: &[u8]) -> Result<StoredItem, IndexError> {
        let decompressed = self.cfg.compression.decompress(data)?;
        let (record, _) = decode_from_slice(&decompressed, standard())?;
        Ok(record)
    }

    fn encode_record(&self, rec: &StoredItem) -> Result<Vec<u8>, IndexError> {
        let encoded = encode_to_vec(rec, standard())?;
        self.cfg.compression.compress(&encoded)
    }
}

impl VectorStore for CollectionIndex {
    fn upsert(&self, collection: &str, item: Item) -> Result<(), IndexError> {
        Self::check_vector(collection, &item.vector)?;
        // Reopened collections pin from their stored records first.
        self.dimension(collection)?;

        let dim = item.vector.len();
        let record = StoredItem {
            schema_version: INDEX_SCHEMA_VERSION,
            id: item.id,
            vector: item.vector,
            payload: item.payload,
        };
        let bytes = self.encode_record(&record)?;

        // Pin, compare and write under one lock so concurrent first writes
        // cannot store two dimensionalities.
        let mut dimensions = self
            .dimensions
            .write()
            .map_err(|_| IndexError::backend("poisoned lock"))?;
        let fresh = !dimensions.contains_key(collection);
        let expected = *dimensions.entry(collection.to_string()).or_insert(dim);
        if expected != dim {
            return Err(IndexError::DimensionMismatch {
                collection: collection.to_string(),
                expected,
                actual: dim,
            });
        }
        if let Err(err) = self.backend.put(collection, record.id.as_str(), &bytes) {
            if fresh {
                dimensions.remove(collection);
            }
            return Err(err);
        }
        drop(dimensions);

        tracing::debug!(collection, id = %record.id, dim, "index_upsert");
        Ok(())
    }

    fn retrieve(&self, collection: &str, id: &ItemId) -> Result<Option<Item>, IndexError> {
        match self.backend.get(collection, id.as_str())? {
            Some(data) => Ok(Some(self.decode_record(&data)?.into())),
            None => Ok(None),
        }
    }

    fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<Item>, IndexError> {
        let mut items = Vec::new();
        if limit == 0 {
            return Ok(items);
        }
        self.scan_items(collection, &mut |item| {
            if items.len() < limit {
                items.push(item);
            }
            Ok(())
        })?;
        Ok(items)
    }

    fn query(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredItem>, IndexError> {
        self.search(collection, vector, filter, limit)
    }
}
