//! # Outfit Archive
//!
//! Persists outfits the user chose to keep. Every saved outfit is a flat
//! record: image path and label of the top, the same for the bottom, the
//! optional score, the prompt that produced it, and a UTC timestamp.
//!
//! Two stores implement [`OutfitStore`]:
//!
//! - [`SqliteOutfitStore`] writes to a `saved_outfits` table (bundled SQLite).
//! - [`InMemoryOutfitStore`] keeps records in a `Vec` for tests and throwaway sessions.
//!
//! ```
//! use archive::{NewOutfit, OutfitStore, SqliteOutfitStore};
//! use index::{Category, Payload};
//!
//! let store = SqliteOutfitStore::open_in_memory().unwrap();
//! let top = Payload::garment("a.jpg", Category::Top).with_product_name("Tee");
//! let bottom = Payload::garment("b.jpg", Category::Bottom).with_product_name("Jeans");
//!
//! store.save(&NewOutfit::from_payloads(&top, &bottom, None, "casual")).unwrap();
//! let saved = store.list_all().unwrap();
//! assert_eq!(saved[0].bottom_description.as_deref(), Some("Jeans"));
//! ```

mod memory;
mod sqlite;

pub use crate::memory::InMemoryOutfitStore;
pub use crate::sqlite::SqliteOutfitStore;

use chrono::{DateTime, Utc};
use index::Payload;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by outfit stores.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored `created_at` value could not be read back as a timestamp.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// An outfit about to be saved. Every field is optional, matching the
/// nullable columns of `saved_outfits`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOutfit {
    pub top_image: Option<String>,
    pub top_description: Option<String>,
    pub bottom_image: Option<String>,
    pub bottom_description: Option<String>,
    pub score: Option<f32>,
    pub prompt: Option<String>,
}

impl NewOutfit {
    /// Flatten a top and a bottom payload into a record.
    ///
    /// Images come from `image_path`; descriptions prefer `product_name`
    /// and fall back to `description`.
    pub fn from_payloads(
        top: &Payload,
        bottom: &Payload,
        score: Option<f32>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            top_image: top.image_path().map(str::to_owned),
            top_description: top.label().map(str::to_owned),
            bottom_image: bottom.image_path().map(str::to_owned),
            bottom_description: bottom.label().map(str::to_owned),
            score,
            prompt: Some(prompt.into()),
        }
    }
}

/// A persisted outfit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOutfit {
    pub id: i64,
    pub top_image: Option<String>,
    pub top_description: Option<String>,
    pub bottom_image: Option<String>,
    pub bottom_description: Option<String>,
    pub score: Option<f32>,
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SavedOutfit {
    pub(crate) fn from_new(id: i64, outfit: &NewOutfit, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            top_image: outfit.top_image.clone(),
            top_description: outfit.top_description.clone(),
            bottom_image: outfit.bottom_image.clone(),
            bottom_description: outfit.bottom_description.clone(),
            score: outfit.score,
            prompt: outfit.prompt.clone(),
            created_at,
        }
    }
}

/// Storage for saved outfits.
pub trait OutfitStore: Send + Sync {
    /// Persist an outfit and return its id. Ids increase monotonically.
    fn save(&self, outfit: &NewOutfit) -> Result<i64, ArchiveError>;

    /// Every saved outfit, newest first. Outfits saved within the same
    /// timestamp come out by id, highest first.
    fn list_all(&self) -> Result<Vec<SavedOutfit>, ArchiveError>;

    /// Delete every saved outfit. Returns how many were removed.
    fn clear(&self) -> Result<usize, ArchiveError>;
}

impl<S: OutfitStore + ?Sized> OutfitStore for Box<S> {
    fn save(&self, outfit: &NewOutfit) -> Result<i64, ArchiveError> {
        (**self).save(outfit)
    }

    fn list_all(&self) -> Result<Vec<SavedOutfit>, ArchiveError> {
        (**self).list_all()
    }

    fn clear(&self) -> Result<usize, ArchiveError> {
        (**self).clear()
    }
}
