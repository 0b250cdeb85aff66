use crate::{CollectionIndex, IndexError, PayloadFilter, ScoredItem};
use std::cmp::Ordering;

/// Chunk size for auto-vectorized accumulation.
const SIMD_CHUNK_SIZE: usize = 32;

impl CollectionIndex {
    /// Cosine similarity between two stored vectors.
    ///
    /// Returns 0.0 for mismatched lengths or a zero norm instead of failing; the
    /// index ranks whatever it holds.
    #[inline]
    pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let mut dot = 0f32;
        let mut norm_a = 0f32;
        let mut norm_b = 0f32;

        for (ca, cb) in a.chunks(SIMD_CHUNK_SIZE).zip(b.chunks(SIMD_CHUNK_SIZE)) {
            let (d, na, nb) = Self::accumulate_chunk(ca, cb);
            dot += d;
            norm_a += na;
            norm_b += nb;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom == 0.0 {
            return 0.0;
        }
        dot / denom
    }

    #[inline(always)]
    fn accumulate_chunk(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
        a.iter()
            .zip(b.iter())
            .fold((0.0, 0.0, 0.0), |(dot, na, nb), (&x, &y)| {
                (dot + x * y, na + x * x, nb + y * y)
            })
    }

    /// Exact top-k search over one collection.
    ///
    /// Every item passing `filter` is scored; results are sorted by score
    /// descending with ties broken by id.
    pub fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredItem>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Self::check_vector(collection, vector)?;
        match self.dimension(collection)? {
            // Nothing stored yet: nothing to rank.
            None => return Ok(Vec::new()),
            Some(expected) if expected != vector.len() => {
                return Err(IndexError::DimensionMismatch {
                    collection: collection.to_string(),
                    expected,
                    actual: vector.len(),
                })
            }
            Some(_) => {}
        }

        let mut results = Vec::new();
        let mut scanned = 0usize;
        self.scan_items(collection, &mut |item| {
            scanned += 1;
            if filter.matches(&item.payload) {
                let score = Self::cosine_similarity(vector, &item.vector);
                results.push(ScoredItem { item, score });
            }
            Ok(())
        })?;

        results.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        results.truncate(limit);

        tracing::debug!(
            collection,
            scanned,
            returned = results.len(),
            limit,
            "index_query"
        );
        Ok(results)
    }
}
