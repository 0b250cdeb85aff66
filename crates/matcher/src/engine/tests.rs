use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embed::{EmbedError, Embedding, ImageSource};
use index::{CollectionIndex, IndexConfig, IndexError, Payload, ScoredItem};

use crate::metrics::{set_match_metrics, MatchMetrics};

const EPS: f32 = 1e-6;

/// Embedder double with a fixed prompt → vector table.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl TableEmbedder {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl EmbeddingProvider for TableEmbedder {
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vector = self
            .table
            .get(text)
            .cloned()
            .ok_or_else(|| EmbedError::Inference(format!("no vector for '{text}'")))?;
        Ok(Embedding {
            embedding_dim: vector.len(),
            vector,
            model_name: "table".into(),
            normalized: true,
        })
    }

    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError> {
        Err(EmbedError::Inference(format!(
            "images unsupported: {}",
            image.describe()
        )))
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

/// Store double that forwards reads but counts and optionally fails queries.
struct CountingStore {
    inner: CollectionIndex,
    queries: AtomicUsize,
    fail_queries: bool,
}

impl VectorStore for CountingStore {
    fn upsert(&self, collection: &str, item: Item) -> Result<(), IndexError> {
        self.inner.upsert(collection, item)
    }

    fn retrieve(&self, collection: &str, id: &ItemId) -> Result<Option<Item>, IndexError> {
        self.inner.retrieve(collection, id)
    }

    fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<Item>, IndexError> {
        self.inner.scroll(collection, limit)
    }

    fn query(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &PayloadFilter,
        limit: usize,
    ) -> Result<Vec<ScoredItem>, IndexError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(IndexError::Backend("connection reset".into()));
        }
        self.inner.query(collection, vector, filter, limit)
    }
}

fn put(index: &CollectionIndex, collection: &str, id: &str, vector: Vec<f32>, payload: Payload) {
    index
        .upsert(collection, Item::new(ItemId::from(id), vector, payload))
        .expect("seed upsert");
}

/// Wardrobe with two tops and one bottom, marketplace with two of each.
fn seeded_index() -> CollectionIndex {
    let index = CollectionIndex::new(IndexConfig::new()).expect("index init");
    put(&index, "wardrobe", "T1", vec![1.0, 0.0], Payload::garment("t1.jpg", Category::Top));
    put(&index, "wardrobe", "T2", vec![0.0, 1.0], Payload::garment("t2.jpg", Category::Top));
    put(
        &index,
        "wardrobe",
        "B1",
        vec![1.0, 0.0],
        Payload::garment("b1.jpg", Category::Bottom).with_description("Jeans"),
    );
    put(
        &index,
        "marketplace",
        "M-top-near",
        vec![0.9, 0.1],
        Payload::garment("m1.jpg", Category::Top).with_product_name("Linen Shirt"),
    );
    put(
        &index,
        "marketplace",
        "M-top-far",
        vec![0.1, 0.9],
        Payload::garment("m2.jpg", Category::Top).with_product_name("Wool Sweater"),
    );
    put(
        &index,
        "marketplace",
        "M-bottom",
        vec![1.0, 0.0],
        Payload::garment("m3.jpg", Category::Bottom).with_product_name("Chinos"),
    );
    put(
        &index,
        "marketplace",
        "M-bottom-2",
        vec![0.7, 0.7],
        Payload::garment("m4.jpg", Category::Bottom).with_product_name("Cargo Pants"),
    );
    put(
        &index,
        "marketplace",
        "M-untagged",
        vec![1.0, 0.0],
        Payload::new().with("image_path", "m5.jpg"),
    );
    index
}

fn casual_embedder() -> Arc<TableEmbedder> {
    Arc::new(TableEmbedder::new(&[
        ("casual", vec![1.0, 0.0]),
        ("wide", vec![1.0, 0.0, 0.0]),
    ]))
}

fn matcher_over(store: Arc<dyn VectorStore>, embedder: Arc<TableEmbedder>) -> Matcher {
    Matcher::new(embedder, store, MatchConfig::default()).expect("matcher init")
}

fn default_matcher() -> Matcher {
    matcher_over(Arc::new(seeded_index()), casual_embedder())
}

fn id_of(payload: &Payload) -> String {
    payload.id().map(|id| id.to_string()).unwrap_or_default()
}

#[test]
fn recommend_ranks_wardrobe_outfits() {
    let matcher = default_matcher();
    let outfits = matcher.recommend("casual", 2).expect("recommend");

    assert_eq!(outfits.len(), 2);
    assert_eq!(id_of(&outfits[0].top), "T1");
    assert_eq!(id_of(&outfits[0].bottom), "B1");
    assert!((outfits[0].score - 1.0).abs() < EPS);
    assert_eq!(id_of(&outfits[1].top), "T2");
    assert!((outfits[1].score - 0.25).abs() < EPS);
    assert_eq!(outfits[0].bottom.description(), Some("Jeans"));
}

#[test]
fn recommend_never_uses_marketplace_items() {
    let matcher = default_matcher();
    let outfits = matcher.recommend("casual", 10).expect("recommend");
    assert_eq!(outfits.len(), 2);
    assert!(outfits
        .iter()
        .all(|pair| !id_of(&pair.top).starts_with('M') && !id_of(&pair.bottom).starts_with('M')));
}

#[test]
fn recommend_pool_limit_bounds_each_category() {
    let matcher = default_matcher();
    // One top makes it into the pool, so only one pair exists.
    let outfits = matcher.recommend("casual", 1).expect("recommend");
    assert_eq!(outfits.len(), 1);
    assert_eq!(id_of(&outfits[0].top), "T1");
}

#[test]
fn recommend_without_bottoms_is_empty() {
    let index = CollectionIndex::new(IndexConfig::new()).expect("index init");
    put(&index, "wardrobe", "T1", vec![1.0, 0.0], Payload::garment("t1.jpg", Category::Top));
    let matcher = matcher_over(Arc::new(index), casual_embedder());

    let outfits = matcher.recommend("casual", 3).expect("recommend");
    assert!(outfits.is_empty());
}

#[test]
fn recommend_on_empty_wardrobe_is_empty() {
    let index = CollectionIndex::new(IndexConfig::new()).expect("index init");
    let matcher = matcher_over(Arc::new(index), casual_embedder());
    assert!(matcher.recommend("casual", 3).expect("recommend").is_empty());
}

#[test]
fn blank_prompt_rejected_before_embedding() {
    let embedder = casual_embedder();
    let matcher = matcher_over(Arc::new(seeded_index()), embedder.clone());

    let err = matcher.recommend("   ", 3).unwrap_err();
    assert!(matches!(err, MatchError::InvalidRequest(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn embedding_failure_skips_store() {
    let store = Arc::new(CountingStore {
        inner: seeded_index(),
        queries: AtomicUsize::new(0),
        fail_queries: false,
    });
    let matcher = matcher_over(store.clone(), casual_embedder());

    let err = matcher.recommend("formal", 3).unwrap_err();
    assert!(matches!(err, MatchError::EmbeddingUnavailable(_)));
    assert_eq!(store.queries.load(Ordering::SeqCst), 0);
}

#[test]
fn store_failure_surfaces_as_index_query_failed() {
    let store = Arc::new(CountingStore {
        inner: seeded_index(),
        queries: AtomicUsize::new(0),
        fail_queries: true,
    });
    let matcher = matcher_over(store, casual_embedder());

    let err = matcher.recommend("casual", 3).unwrap_err();
    assert!(matches!(err, MatchError::IndexQueryFailed(_)));
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn prompt_from_another_model_is_a_dimension_mismatch() {
    let matcher = default_matcher();
    let err = matcher.recommend("wide", 3).unwrap_err();
    assert!(matches!(
        err,
        MatchError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
}

#[test]
fn marketplace_matches_complement_the_outfit_bottom() {
    let matcher = default_matcher();
    let outfits = matcher.recommend("casual", 1).expect("recommend");

    let items = matcher
        .marketplace_matches(&outfits[0], 5)
        .expect("marketplace matches");
    let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["M-top-near", "M-top-far"]);
    assert!(items
        .iter()
        .all(|item| item.payload.category() == Some(Category::Top)));
}

#[test]
fn marketplace_matches_requires_bottom_id() {
    let matcher = default_matcher();
    let pair = ScoredPair {
        score: 1.0,
        coherence: 1.0,
        query_relevance: 1.0,
        top: Payload::garment("t.jpg", Category::Top),
        bottom: Payload::garment("b.jpg", Category::Bottom),
    };
    let err = matcher.marketplace_matches(&pair, 2).unwrap_err();
    assert!(matches!(err, MatchError::InvalidRequest(_)));
}

#[test]
fn marketplace_matches_with_stale_bottom_is_anchor_not_found() {
    let matcher = default_matcher();
    let pair = ScoredPair {
        score: 1.0,
        coherence: 1.0,
        query_relevance: 1.0,
        top: Payload::garment("t.jpg", Category::Top).with_id(&ItemId::from("T1")),
        bottom: Payload::garment("b.jpg", Category::Bottom).with_id(&ItemId::from("gone")),
    };
    let err = matcher.marketplace_matches(&pair, 2).unwrap_err();
    assert!(matches!(
        err,
        MatchError::AnchorNotFound { ref collection, .. } if collection == "wardrobe"
    ));
}

#[test]
fn wardrobe_matches_pair_marketplace_top_with_wardrobe_bottoms() {
    let matcher = default_matcher();
    let found = matcher
        .wardrobe_matches(&ItemId::from("M-top-near"), crate::DEFAULT_PAIRING_LIMIT)
        .expect("wardrobe matches");

    assert_eq!(found.category, Category::Bottom);
    assert_eq!(found.anchor.id(), Some(ItemId::from("M-top-near")));
    assert_eq!(found.anchor.label(), Some("Linen Shirt"));
    let ids: Vec<&str> = found.matches.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["B1"]);
}

#[test]
fn wardrobe_matches_unknown_item() {
    let matcher = default_matcher();
    let err = matcher
        .wardrobe_matches(&ItemId::from("nope"), 2)
        .unwrap_err();
    assert!(matches!(
        err,
        MatchError::AnchorNotFound { ref collection, .. } if collection == "marketplace"
    ));
}

#[test]
fn wardrobe_matches_needs_category() {
    let matcher = default_matcher();
    let err = matcher
        .wardrobe_matches(&ItemId::from("M-untagged"), 2)
        .unwrap_err();
    assert!(matches!(err, MatchError::MissingCategory { .. }));
}

#[test]
fn blank_collection_names_rejected() {
    let result = Matcher::new(
        casual_embedder(),
        Arc::new(seeded_index()),
        MatchConfig::new("wardrobe", ""),
    );
    assert!(matches!(result, Err(MatchError::InvalidConfig(_))));
}

#[test]
fn custom_collection_names_are_honoured() {
    let index = CollectionIndex::new(IndexConfig::new()).expect("index init");
    put(&index, "closet", "T", vec![1.0, 0.0], Payload::garment("t.jpg", Category::Top));
    put(&index, "closet", "B", vec![1.0, 0.0], Payload::garment("b.jpg", Category::Bottom));
    let matcher = Matcher::new(
        casual_embedder(),
        Arc::new(index),
        MatchConfig::new("closet", "shop"),
    )
    .expect("matcher init");

    let outfits = matcher.recommend("casual", 3).expect("recommend");
    assert_eq!(outfits.len(), 1);
    assert_eq!(matcher.config().wardrobe_collection, "closet");
}

#[derive(Default)]
struct RecordingMetrics {
    matches: Mutex<Vec<(MatchOperation, usize)>>,
    failures: Mutex<Vec<MatchOperation>>,
}

impl MatchMetrics for RecordingMetrics {
    fn record_match(&self, operation: MatchOperation, _latency: Duration, result_count: usize) {
        self.matches
            .lock()
            .expect("metrics lock")
            .push((operation, result_count));
    }

    fn record_failure(&self, operation: MatchOperation, _latency: Duration) {
        self.failures.lock().expect("metrics lock").push(operation);
    }
}

#[test]
fn metrics_recorder_observes_operations() {
    let recorder = Arc::new(RecordingMetrics::default());
    set_match_metrics(Some(recorder.clone()));

    let matcher = default_matcher();
    let outfits = matcher.recommend("casual", 2).expect("recommend");
    matcher
        .marketplace_matches(&outfits[0], 1)
        .expect("marketplace matches");
    let _ = matcher.wardrobe_matches(&ItemId::from("nope"), 2);

    set_match_metrics(None);

    // Other tests may report concurrently while the recorder is installed.
    let matches = recorder.matches.lock().expect("metrics lock");
    assert!(matches.contains(&(MatchOperation::Recommend, 2)));
    assert!(matches.contains(&(MatchOperation::MarketplaceMatches, 1)));
    let failures = recorder.failures.lock().expect("metrics lock");
    assert!(failures.contains(&MatchOperation::WardrobeMatches));
}
