use std::sync::Arc;
use std::time::Instant;

use embed::EmbeddingProvider;
use index::{Category, Item, ItemId, PayloadFilter, VectorStore};
use tracing::{debug, info, warn};

use crate::metrics::{metrics_recorder, MatchOperation};
use crate::ranker::rank_outfits;
use crate::resolver::find_similar_in_collection;
use crate::types::{MatchConfig, MatchError, ScoredPair};

#[cfg(test)]
mod tests;

/// A marketplace item together with the wardrobe pieces that complete it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredMatches {
    /// The item the search started from, id injected into its payload.
    pub anchor: index::Payload,
    /// Slot the matches fill (the anchor's complement).
    pub category: Category,
    pub matches: Vec<Item>,
}

/// Outfit engine over an embedding provider and a vector store.
///
/// Holds no per-request state; one instance serves any number of concurrent
/// requests as long as the store supports concurrent reads.
pub struct Matcher {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    cfg: MatchConfig,
}

impl Matcher {
    /// Construct a matcher from shared collaborator handles.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        cfg: MatchConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        Ok(Self {
            embedder,
            store,
            cfg,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Rank wardrobe outfits for a free-text style prompt.
    ///
    /// Embeds the prompt, fetches the `limit` nearest wardrobe tops and
    /// bottoms, then scores every pair. An empty result means the wardrobe
    /// lacks a top or a bottom.
    pub fn recommend(&self, query_text: &str, limit: usize) -> Result<Vec<ScoredPair>, MatchError> {
        let start = Instant::now();
        let result = self.recommend_inner(query_text, limit);
        report(
            MatchOperation::Recommend,
            start,
            result.as_ref().map(Vec::len),
        );
        result
    }

    fn recommend_inner(
        &self,
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<ScoredPair>, MatchError> {
        if query_text.trim().is_empty() {
            return Err(MatchError::InvalidRequest(
                "query_text must not be empty".into(),
            ));
        }

        let query = self.embedder.embed_text(query_text)?.into_vector();
        let tops = self.wardrobe_pool(&query, Category::Top, limit)?;
        let bottoms = self.wardrobe_pool(&query, Category::Bottom, limit)?;
        debug!(
            tops = tops.len(),
            bottoms = bottoms.len(),
            pairs = tops.len() * bottoms.len(),
            "recommend_pools"
        );

        rank_outfits(&query, &tops, &bottoms, limit)
    }

    fn wardrobe_pool(
        &self,
        query: &[f32],
        category: Category,
        limit: usize,
    ) -> Result<Vec<Item>, MatchError> {
        let hits = self.store.query(
            &self.cfg.wardrobe_collection,
            query,
            &PayloadFilter::category(category),
            limit,
        )?;
        Ok(hits.into_iter().map(|hit| hit.item).collect())
    }

    /// Marketplace items that go with the bottom of a recommended outfit.
    ///
    /// The bottom is the anchor, the wardrobe its origin and the marketplace the
    /// target; only items of the complementary slot are returned, in the
    /// store's order.
    pub fn marketplace_matches(
        &self,
        pair: &ScoredPair,
        limit: usize,
    ) -> Result<Vec<Item>, MatchError> {
        let start = Instant::now();
        let result = self.marketplace_matches_inner(pair, limit);
        report(
            MatchOperation::MarketplaceMatches,
            start,
            result.as_ref().map(Vec::len),
        );
        result
    }

    fn marketplace_matches_inner(
        &self,
        pair: &ScoredPair,
        limit: usize,
    ) -> Result<Vec<Item>, MatchError> {
        let anchor_id = pair.bottom.id().ok_or_else(|| {
            MatchError::InvalidRequest("outfit bottom carries no item id".into())
        })?;
        let category = pair
            .bottom
            .category()
            .ok_or_else(|| MatchError::MissingCategory {
                id: anchor_id.clone(),
            })?;

        find_similar_in_collection(
            self.store.as_ref(),
            &anchor_id,
            &self.cfg.wardrobe_collection,
            &self.cfg.marketplace_collection,
            category.complement(),
            limit,
        )
    }

    /// Wardrobe pieces that complete a marketplace item.
    pub fn wardrobe_matches(
        &self,
        marketplace_item: &ItemId,
        limit: usize,
    ) -> Result<AnchoredMatches, MatchError> {
        let start = Instant::now();
        let result = self.wardrobe_matches_inner(marketplace_item, limit);
        report(
            MatchOperation::WardrobeMatches,
            start,
            result.as_ref().map(|m| m.matches.len()),
        );
        result
    }

    fn wardrobe_matches_inner(
        &self,
        marketplace_item: &ItemId,
        limit: usize,
    ) -> Result<AnchoredMatches, MatchError> {
        let marketplace = &self.cfg.marketplace_collection;
        let anchor = self
            .store
            .retrieve(marketplace, marketplace_item)?
            .ok_or_else(|| MatchError::AnchorNotFound {
                collection: marketplace.clone(),
                id: marketplace_item.clone(),
            })?;
        let category = anchor
            .payload
            .category()
            .ok_or_else(|| MatchError::MissingCategory {
                id: marketplace_item.clone(),
            })?
            .complement();

        let matches = find_similar_in_collection(
            self.store.as_ref(),
            marketplace_item,
            marketplace,
            &self.cfg.wardrobe_collection,
            category,
            limit,
        )?;

        Ok(AnchoredMatches {
            anchor: anchor.payload.with_id(&anchor.id),
            category,
            matches,
        })
    }
}

fn report(operation: MatchOperation, start: Instant, outcome: Result<usize, &MatchError>) {
    let latency = start.elapsed();
    let elapsed_micros = latency.as_micros() as u64;
    let recorder = metrics_recorder();
    match outcome {
        Ok(results) => {
            info!(%operation, results, elapsed_micros, "match_success");
            if let Some(recorder) = recorder {
                recorder.record_match(operation, latency, results);
            }
        }
        Err(err) => {
            warn!(%operation, error = %err, elapsed_micros, "match_failure");
            if let Some(recorder) = recorder {
                recorder.record_failure(operation, latency);
            }
        }
    }
}
