use embed::EmbedError;
use index::{IndexError, ItemId, Payload};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which collections the engine reads from.
///
/// Both collections must be embedded by the same model; the index rejects
/// queries whose dimensionality does not match what a collection holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// The user's own garments. Outfits are assembled from here.
    #[serde(default = "MatchConfig::default_wardrobe")]
    pub wardrobe_collection: String,
    /// Third-party garments suggested alongside the user's outfits.
    #[serde(default = "MatchConfig::default_marketplace")]
    pub marketplace_collection: String,
}

impl MatchConfig {
    pub(crate) fn default_wardrobe() -> String {
        "wardrobe".to_string()
    }

    pub(crate) fn default_marketplace() -> String {
        "marketplace".to_string()
    }

    pub fn new(wardrobe: impl Into<String>, marketplace: impl Into<String>) -> Self {
        Self {
            wardrobe_collection: wardrobe.into(),
            marketplace_collection: marketplace.into(),
        }
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.wardrobe_collection.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "wardrobe_collection must not be empty".into(),
            ));
        }
        if self.marketplace_collection.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "marketplace_collection must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(Self::default_wardrobe(), Self::default_marketplace())
    }
}

/// A candidate outfit: one top and one bottom with their blended score.
///
/// `top` and `bottom` are payload copies carrying the originating item id
/// under `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPair {
    /// `RELEVANCE_WEIGHT * query_relevance + COHERENCE_WEIGHT * coherence`.
    pub score: f32,
    /// Cosine similarity between the top and the bottom.
    pub coherence: f32,
    /// Mean cosine similarity of the two garments to the query.
    pub query_relevance: f32,
    pub top: Payload,
    pub bottom: Payload,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The embedding provider failed; the request produced nothing.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(#[source] EmbedError),
    /// The anchor id does not exist in its origin collection.
    #[error("anchor '{id}' not found in collection '{collection}'")]
    AnchorNotFound { collection: String, id: ItemId },
    /// The vector store failed while reading or querying.
    #[error("index query failed: {0}")]
    IndexQueryFailed(#[source] IndexError),
    /// Vectors from different embedding spaces were compared.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// An item needed for pairing carries no usable `category`.
    #[error("item '{id}' has no usable category")]
    MissingCategory { id: ItemId },
    /// The request itself is malformed (blank prompt, payload without id, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Invalid engine configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
}

impl From<EmbedError> for MatchError {
    fn from(err: EmbedError) -> Self {
        MatchError::EmbeddingUnavailable(err)
    }
}

impl From<IndexError> for MatchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch {
                expected, actual, ..
            } => MatchError::DimensionMismatch { expected, actual },
            other => MatchError::IndexQueryFailed(other),
        }
    }
}
