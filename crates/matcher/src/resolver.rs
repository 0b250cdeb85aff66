use index::{Category, Item, ItemId, PayloadFilter, VectorStore};

use crate::types::MatchError;

/// Items of `target_collection` most similar to an anchor from `origin_collection`.
///
/// The anchor's stored vector is the query; only items whose `category`
/// equals `category_filter` are considered. Results keep the store's native
/// similarity order and are not re-scored. When origin and target coincide
/// the anchor may appear in its own results.
///
/// Fails with [`MatchError::AnchorNotFound`] before touching the target
/// collection when the anchor does not exist.
pub fn find_similar_in_collection(
    store: &dyn VectorStore,
    item_id: &ItemId,
    origin_collection: &str,
    target_collection: &str,
    category_filter: Category,
    limit: usize,
) -> Result<Vec<Item>, MatchError> {
    let anchor = store
        .retrieve(origin_collection, item_id)?
        .ok_or_else(|| MatchError::AnchorNotFound {
            collection: origin_collection.to_string(),
            id: item_id.clone(),
        })?;

    let hits = store.query(
        target_collection,
        &anchor.vector,
        &PayloadFilter::category(category_filter),
        limit,
    )?;
    Ok(hits.into_iter().map(|hit| hit.item).collect())
}
