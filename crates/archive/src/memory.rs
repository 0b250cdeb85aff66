use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::{ArchiveError, NewOutfit, OutfitStore, SavedOutfit};

#[derive(Default)]
struct State {
    next_id: i64,
    outfits: Vec<SavedOutfit>,
}

/// Outfit store that keeps everything in memory.
#[derive(Default)]
pub struct InMemoryOutfitStore {
    state: Mutex<State>,
}

impl InMemoryOutfitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutfitStore for InMemoryOutfitStore {
    fn save(&self, outfit: &NewOutfit) -> Result<i64, ArchiveError> {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state
            .outfits
            .push(SavedOutfit::from_new(id, outfit, Utc::now()));
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<SavedOutfit>, ArchiveError> {
        let mut outfits = self.state().outfits.clone();
        outfits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(outfits)
    }

    fn clear(&self) -> Result<usize, ArchiveError> {
        let mut state = self.state();
        let removed = state.outfits.len();
        state.outfits.clear();
        Ok(removed)
    }
}
