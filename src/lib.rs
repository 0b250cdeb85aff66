//! Workspace umbrella crate for the outfit assistant.
//!
//! Wires the embedding provider (`embed`), the garment index (`index`), the
//! outfit engine (`matcher`), and the saved-outfit archive (`archive`) behind
//! one [`OutfitAssistant`]. Every collaborator is injected, so tests and
//! alternative deployments swap providers or stores without touching the
//! engine.
//!
//! ```
//! use outfit::{Category, Collection, OutfitAssistant, OutfitConfig, Payload};
//!
//! let assistant = OutfitAssistant::from_config(&OutfitConfig::default()).unwrap();
//! # let dir = tempfile::tempdir().unwrap();
//! # let shirt = dir.path().join("shirt.jpg");
//! # let jeans = dir.path().join("jeans.jpg");
//! # std::fs::write(&shirt, b"shirt-bytes").unwrap();
//! # std::fs::write(&jeans, b"jeans-bytes").unwrap();
//! assistant.add_item(Collection::Wardrobe, &shirt, Category::Top, Payload::new()).unwrap();
//! assistant.add_item(Collection::Wardrobe, &jeans, Category::Bottom, Payload::new()).unwrap();
//!
//! let rec = assistant.generate("casual friday").unwrap();
//! assert_eq!(rec.outfits.len(), 1);
//! ```

pub mod config;

pub use crate::config::{ConfigLoadError, OutfitConfig, RecommendYamlConfig};
pub use archive::{
    ArchiveError, InMemoryOutfitStore, NewOutfit, OutfitStore, SavedOutfit, SqliteOutfitStore,
};
pub use embed::{
    build_provider, EmbedConfig, EmbedError, Embedding, EmbeddingProvider, ImageSource,
};
pub use index::{
    Category, CollectionIndex, IndexConfig, IndexError, Item, ItemId, Payload, VectorStore,
};
pub use matcher::{
    set_match_metrics, AnchoredMatches, MatchConfig, MatchError, MatchMetrics, Matcher,
    ScoredPair,
};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Items listed from the wardrobe when no limit is given.
pub const DEFAULT_WARDROBE_PAGE: usize = 100;
/// Items listed from the marketplace when no limit is given.
pub const DEFAULT_MARKETPLACE_PAGE: usize = 50;

/// Errors surfaced by [`OutfitAssistant`].
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Match(#[from] MatchError),
    /// The embedding provider could not be built. Embedding failures at
    /// request time surface as [`MatchError::EmbeddingUnavailable`].
    #[error("embedding provider setup failed: {0}")]
    Embed(#[from] EmbedError),
    #[error("index failure: {0}")]
    Index(#[from] IndexError),
    #[error("archive failure: {0}")]
    Archive(#[from] ArchiveError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigLoadError),
    /// The id exists in neither collection.
    #[error("unknown item '{0}'")]
    UnknownItem(ItemId),
}

/// Which of the two collections an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Wardrobe,
    Marketplace,
}

impl Collection {
    pub fn default_page(self) -> usize {
        match self {
            Collection::Wardrobe => DEFAULT_WARDROBE_PAGE,
            Collection::Marketplace => DEFAULT_MARKETPLACE_PAGE,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Wardrobe => f.write_str("wardrobe"),
            Collection::Marketplace => f.write_str("marketplace"),
        }
    }
}

/// Result of one prompt: ranked outfits plus marketplace suggestions for the
/// best one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub prompt: String,
    pub outfits: Vec<ScoredPair>,
    /// Bottom of the first outfit, which the marketplace search started from.
    pub anchor: Option<Payload>,
    /// Marketplace payloads (id included) that complement `anchor`.
    pub marketplace_hits: Vec<Payload>,
}

/// The assistant: ingest garments, recommend outfits, keep the ones you like.
pub struct OutfitAssistant {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    archive: Box<dyn OutfitStore>,
    matcher: Matcher,
    limits: RecommendYamlConfig,
}

impl OutfitAssistant {
    /// Assemble an assistant from explicit collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        archive: Box<dyn OutfitStore>,
        match_cfg: MatchConfig,
        limits: RecommendYamlConfig,
    ) -> Result<Self, AssistantError> {
        let matcher = Matcher::new(Arc::clone(&embedder), Arc::clone(&store), match_cfg)?;
        Ok(Self {
            embedder,
            store,
            archive,
            matcher,
            limits,
        })
    }

    /// Build every collaborator from configuration.
    pub fn from_config(cfg: &OutfitConfig) -> Result<Self, AssistantError> {
        cfg.validate()?;
        let embedder: Arc<dyn EmbeddingProvider> = Arc::from(build_provider(&cfg.embed)?);
        let store: Arc<dyn VectorStore> = Arc::new(CollectionIndex::new(cfg.index_config())?);
        let archive = cfg.open_archive()?;
        debug!(
            embed_mode = %cfg.embed.mode,
            index_backend = %cfg.index.backend,
            archive_backend = %cfg.archive.backend,
            "assistant_ready"
        );
        Self::new(embedder, store, archive, cfg.match_config(), cfg.recommend)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    fn collection_name(&self, collection: Collection) -> &str {
        let cfg = self.matcher.config();
        match collection {
            Collection::Wardrobe => &cfg.wardrobe_collection,
            Collection::Marketplace => &cfg.marketplace_collection,
        }
    }

    /// Embed a garment photo and store it with a fresh id.
    ///
    /// `payload` carries optional extras (`description`, `product_name`,
    /// `price`, ...); `image_path` and `category` are set from the arguments.
    pub fn add_item(
        &self,
        collection: Collection,
        image_path: impl AsRef<Path>,
        category: Category,
        payload: Payload,
    ) -> Result<ItemId, AssistantError> {
        let image_path = image_path.as_ref();
        let embedding = self
            .embedder
            .embed_image(&ImageSource::path(image_path))
            .map_err(MatchError::from)?;
        let payload = payload
            .with("image_path", image_path.display().to_string())
            .with("category", category.as_str());

        let id = ItemId::generate();
        self.store.upsert(
            self.collection_name(collection),
            Item::new(id.clone(), embedding.into_vector(), payload),
        )?;
        info!(%collection, %id, %category, "item_added");
        Ok(id)
    }

    /// Up to `limit` items of a collection (the collection's default page size
    /// when `None`), payloads carrying their ids.
    pub fn list_items(
        &self,
        collection: Collection,
        limit: Option<usize>,
    ) -> Result<Vec<Item>, AssistantError> {
        let limit = limit.unwrap_or_else(|| collection.default_page());
        let items = self.store.scroll(self.collection_name(collection), limit)?;
        Ok(items
            .into_iter()
            .map(|item| Item {
                payload: item.payload.with_id(&item.id),
                ..item
            })
            .collect())
    }

    /// Rank outfits for a prompt and suggest marketplace items for the best one.
    pub fn generate(&self, prompt: &str) -> Result<Recommendation, AssistantError> {
        self.generate_with(prompt, self.limits.outfit_limit, true)
    }

    /// [`generate`](Self::generate) with explicit limits. The marketplace
    /// follow-up is skipped when `with_marketplace` is false or no outfit was
    /// found.
    pub fn generate_with(
        &self,
        prompt: &str,
        outfit_limit: usize,
        with_marketplace: bool,
    ) -> Result<Recommendation, AssistantError> {
        let outfits = self.matcher.recommend(prompt, outfit_limit)?;

        let mut anchor = None;
        let mut marketplace_hits = Vec::new();
        if with_marketplace {
            if let Some(best) = outfits.first() {
                let items = self
                    .matcher
                    .marketplace_matches(best, self.limits.marketplace_limit)?;
                marketplace_hits = items
                    .into_iter()
                    .map(|item| item.payload.with_id(&item.id))
                    .collect();
                anchor = Some(best.bottom.clone());
            }
        }

        Ok(Recommendation {
            prompt: prompt.to_string(),
            outfits,
            anchor,
            marketplace_hits,
        })
    }

    /// Wardrobe pieces that complete a marketplace item.
    pub fn pair_marketplace_item(
        &self,
        id: &ItemId,
        limit: Option<usize>,
    ) -> Result<AnchoredMatches, AssistantError> {
        let limit = limit.unwrap_or(self.limits.marketplace_limit);
        Ok(self.matcher.wardrobe_matches(id, limit)?)
    }

    /// Save a recommended outfit together with its score.
    pub fn save_outfit(&self, pair: &ScoredPair, prompt: &str) -> Result<i64, AssistantError> {
        let outfit = NewOutfit::from_payloads(&pair.top, &pair.bottom, Some(pair.score), prompt);
        Ok(self.archive.save(&outfit)?)
    }

    /// Save an outfit assembled by hand. Each id is looked up in the wardrobe
    /// first, then in the marketplace.
    pub fn save_items(
        &self,
        top: &ItemId,
        bottom: &ItemId,
        prompt: &str,
        score: Option<f32>,
    ) -> Result<i64, AssistantError> {
        let top = self.lookup(top)?;
        let bottom = self.lookup(bottom)?;
        let outfit = NewOutfit::from_payloads(&top, &bottom, score, prompt);
        Ok(self.archive.save(&outfit)?)
    }

    fn lookup(&self, id: &ItemId) -> Result<Payload, AssistantError> {
        for collection in [Collection::Wardrobe, Collection::Marketplace] {
            if let Some(item) = self.store.retrieve(self.collection_name(collection), id)? {
                return Ok(item.payload.with_id(&item.id));
            }
        }
        Err(AssistantError::UnknownItem(id.clone()))
    }

    /// Saved outfits, newest first.
    pub fn saved_outfits(&self) -> Result<Vec<SavedOutfit>, AssistantError> {
        Ok(self.archive.list_all()?)
    }

    /// Delete every saved outfit; returns how many were removed.
    pub fn clear_saved_outfits(&self) -> Result<usize, AssistantError> {
        let removed = self.archive.clear()?;
        info!(removed, "saved_outfits_cleared");
        Ok(removed)
    }
}
