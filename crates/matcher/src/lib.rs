//! # Outfit Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the embedding layer (`embed`) and the vector index
//! (`index`). It turns a free-text style prompt into ranked top/bottom outfits
//! drawn from the user's wardrobe, and links wardrobe garments with
//! complementary marketplace items in both directions.
//!
//! ## Core Types
//!
//! - [`Matcher`]: the engine. Holds shared handles to an
//!   [`EmbeddingProvider`](embed::EmbeddingProvider) and a
//!   [`VectorStore`](index::VectorStore).
//! - [`ScoredPair`]: one outfit with its blended score, coherence, and query
//!   relevance.
//! - [`MatchConfig`]: names of the wardrobe and marketplace collections.
//! - [`MatchError`]: every failure the engine can report.
//!
//! ## Scoring
//!
//! For a query vector `q`, top `t`, and bottom `b`:
//!
//! ```text
//! coherence       = cos(t, b)
//! query_relevance = (cos(q, t) + cos(q, b)) / 2
//! score           = 0.5 * query_relevance + 0.5 * coherence
//! ```
//!
//! Pairs are sorted by score, highest first, with ties kept in enumeration
//! order. See [`rank_outfits`].
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use embed::{EmbeddingProvider, StubEmbedder};
//! use index::{Category, CollectionIndex, IndexConfig, Item, ItemId, Payload, VectorStore};
//! use matcher::{MatchConfig, Matcher};
//!
//! let embedder = Arc::new(StubEmbedder::new(16));
//! let index = Arc::new(CollectionIndex::new(IndexConfig::new()).unwrap());
//!
//! for (id, text, category) in [
//!     ("shirt", "white linen shirt", Category::Top),
//!     ("chinos", "beige chinos", Category::Bottom),
//! ] {
//!     let vector = embedder.embed_text(text).unwrap().into_vector();
//!     let payload = Payload::garment(format!("{id}.jpg"), category);
//!     index.upsert("wardrobe", Item::new(ItemId::from(id), vector, payload)).unwrap();
//! }
//!
//! let matcher = Matcher::new(embedder, index, MatchConfig::default()).unwrap();
//! let outfits = matcher.recommend("summer brunch", 3).unwrap();
//! assert_eq!(outfits.len(), 1);
//! ```
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to record
//! per-operation latency and result counts. This is typically done once during
//! startup so every [`Matcher`] shares the same metrics backend.

pub mod engine;
pub mod metrics;
pub mod ranker;
pub mod resolver;
pub mod similarity;
pub mod types;

pub use crate::engine::{AnchoredMatches, Matcher};
pub use crate::metrics::{set_match_metrics, MatchMetrics, MatchOperation};
pub use crate::ranker::{rank_outfits, COHERENCE_WEIGHT, RELEVANCE_WEIGHT};
pub use crate::resolver::find_similar_in_collection;
pub use crate::similarity::cosine_similarity;
pub use crate::types::{MatchConfig, MatchError, ScoredPair};

/// How many complementary items a pairing lookup returns unless told otherwise.
pub const DEFAULT_PAIRING_LIMIT: usize = 2;
