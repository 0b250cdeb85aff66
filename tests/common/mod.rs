#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use outfit::{
    Category, Collection, CollectionIndex, EmbedError, Embedding, EmbeddingProvider,
    ImageSource, InMemoryOutfitStore, IndexConfig, ItemId, MatchConfig, OutfitAssistant,
    Payload, RecommendYamlConfig,
};

/// Embedder with hand-picked vectors: images are keyed by file stem, prompts
/// by their exact text.
pub struct TableEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, [f32; 2])]) -> Self {
        Self {
            vectors: entries
                .iter()
                .map(|(key, v)| (key.to_string(), v.to_vec()))
                .collect(),
        }
    }

    fn lookup(&self, key: &str) -> Result<Embedding, EmbedError> {
        let vector = self
            .vectors
            .get(key)
            .cloned()
            .ok_or_else(|| EmbedError::Inference(format!("no vector for '{key}'")))?;
        Ok(Embedding {
            embedding_dim: vector.len(),
            vector,
            model_name: "table".into(),
            normalized: true,
        })
    }
}

impl EmbeddingProvider for TableEmbedder {
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError> {
        self.lookup(text)
    }

    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError> {
        let key = match image {
            ImageSource::Path(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ImageSource::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        self.lookup(&key)
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

/// Vectors for the closet used across the integration tests.
pub fn closet_embedder() -> TableEmbedder {
    TableEmbedder::new(&[
        ("t1", [1.0, 0.0]),
        ("t2", [0.0, 1.0]),
        ("b1", [1.0, 0.0]),
        ("m1", [0.9, 0.1]),
        ("m2", [1.0, 0.0]),
        ("casual", [1.0, 0.0]),
        ("cozy", [0.0, 1.0]),
    ])
}

pub fn assistant_with(embedder: TableEmbedder) -> OutfitAssistant {
    OutfitAssistant::new(
        Arc::new(embedder),
        Arc::new(CollectionIndex::new(IndexConfig::new()).expect("index init")),
        Box::new(InMemoryOutfitStore::new()),
        MatchConfig::default(),
        RecommendYamlConfig::default(),
    )
    .expect("assistant init")
}

/// Ids of the seeded closet.
pub struct Closet {
    pub t1: ItemId,
    pub t2: ItemId,
    pub b1: ItemId,
    pub m1: ItemId,
    pub m2: ItemId,
}

/// Wardrobe: two tops and jeans. Marketplace: a linen shirt and chinos.
pub fn seed_closet(assistant: &OutfitAssistant) -> Closet {
    let add = |collection, path: &str, category, payload| {
        assistant
            .add_item(collection, path, category, payload)
            .expect("add item")
    };
    Closet {
        t1: add(Collection::Wardrobe, "img/t1.jpg", Category::Top, Payload::new()),
        t2: add(Collection::Wardrobe, "img/t2.jpg", Category::Top, Payload::new()),
        b1: add(
            Collection::Wardrobe,
            "img/b1.jpg",
            Category::Bottom,
            Payload::new().with_description("Jeans"),
        ),
        m1: add(
            Collection::Marketplace,
            "shop/m1.jpg",
            Category::Top,
            Payload::new().with_product_name("Linen Shirt").with_price(39.0),
        ),
        m2: add(
            Collection::Marketplace,
            "shop/m2.jpg",
            Category::Bottom,
            Payload::new().with_product_name("Chinos"),
        ),
    }
}
