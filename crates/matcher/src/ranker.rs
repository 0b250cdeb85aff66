use index::Item;

use crate::similarity::cosine_similarity;
use crate::types::{MatchError, ScoredPair};

/// Share of the pair score carried by query relevance.
pub const RELEVANCE_WEIGHT: f32 = 0.5;
/// Share of the pair score carried by top/bottom coherence.
pub const COHERENCE_WEIGHT: f32 = 0.5;

/// Score every top × bottom pair against `query` and keep the best `limit`.
///
/// Pairs are sorted by score descending; equal scores keep enumeration order
/// (tops outer, bottoms inner). An empty pool yields an empty result, which
/// callers read as "not enough wardrobe to build an outfit".
///
/// Fails with [`MatchError::DimensionMismatch`] if any candidate vector does not
/// have the query's length.
pub fn rank_outfits(
    query: &[f32],
    tops: &[Item],
    bottoms: &[Item],
    limit: usize,
) -> Result<Vec<ScoredPair>, MatchError> {
    if tops.is_empty() || bottoms.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    for item in tops.iter().chain(bottoms) {
        if item.vector.len() != query.len() {
            return Err(MatchError::DimensionMismatch {
                expected: query.len(),
                actual: item.vector.len(),
            });
        }
    }

    // Relevance of each garment to the query is shared by every pair it joins.
    let top_relevance: Vec<f32> = tops
        .iter()
        .map(|t| cosine_similarity(query, &t.vector))
        .collect();
    let bottom_relevance: Vec<f32> = bottoms
        .iter()
        .map(|b| cosine_similarity(query, &b.vector))
        .collect();

    let mut pairs = Vec::with_capacity(tops.len() * bottoms.len());
    for (top, top_rel) in tops.iter().zip(&top_relevance) {
        let top_payload = top.payload.with_id(&top.id);
        for (bottom, bottom_rel) in bottoms.iter().zip(&bottom_relevance) {
            let coherence = cosine_similarity(&top.vector, &bottom.vector);
            let query_relevance = (top_rel + bottom_rel) / 2.0;
            pairs.push(ScoredPair {
                score: RELEVANCE_WEIGHT * query_relevance + COHERENCE_WEIGHT * coherence,
                coherence,
                query_relevance,
                top: top_payload.clone(),
                bottom: bottom.payload.with_id(&bottom.id),
            });
        }
    }

    // `sort_by` is stable.
    pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
    pairs.truncate(limit);
    Ok(pairs)
}
