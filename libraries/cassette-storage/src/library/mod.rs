//! Cassette library
//!
//! Holds the user's cassettes and the mounted one, and records the resume
//! bookmark (track + position) for each cassette as it plays. The whole
//! library is one JSON document in the gateway; every mutation writes it
//! through.
//!
//! # Example
//!
//! ```rust
//! use cassette_core::{NewCassette, PlaybackMemory, Track};
//! use cassette_storage::{InMemoryGateway, MemoryStore};
//! use std::sync::Arc;
//!
//! # fn main() -> cassette_core::Result<()> {
//! let mut library = MemoryStore::open(Arc::new(InMemoryGateway::new()));
//!
//! let roadtrip = library.add_cassette(NewCassette {
//!     name: "Roadtrip Vol. 1".to_string(),
//!     tracks: vec![Track::new("1", "Timeless", "The Weeknd", "Timeless.mp3")],
//!     accent_color: "#7E57FF".to_string(),
//! })?;
//!
//! library.update_playback_memory(&roadtrip.id, &"1".into(), 42.0)?;
//! assert_eq!(library.last_played().map(|c| &c.id), Some(&roadtrip.id));
//! # Ok(())
//! # }
//! ```

use crate::error::StorageError;
use cassette_core::{
    Cassette, CassetteId, CassetteUpdate, NewCassette, PersistenceGateway, PlaybackMemory, Result,
    TrackId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Gateway key of the library document
pub const LIBRARY_KEY: &str = "cassette-library";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryDocument {
    #[serde(default)]
    cassettes: Vec<Cassette>,
    #[serde(default)]
    active_cassette_id: Option<CassetteId>,
}

/// Cassette library with write-through persistence
pub struct MemoryStore {
    gateway: Arc<dyn PersistenceGateway>,
    doc: LibraryDocument,
}

impl MemoryStore {
    /// Load the library from the gateway
    ///
    /// A missing, unreadable, or corrupt document yields an empty library.
    pub fn open(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let doc = match gateway.get(LIBRARY_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<LibraryDocument>(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    let err = StorageError::Corrupt {
                        key: LIBRARY_KEY.to_string(),
                        reason: e.to_string(),
                    };
                    warn!(error = %err, "starting with an empty library");
                    LibraryDocument::default()
                }
            },
            Ok(None) => LibraryDocument::default(),
            Err(e) => {
                warn!(error = %e, "library unavailable, starting empty");
                LibraryDocument::default()
            }
        };

        let mut store = Self { gateway, doc };
        store.drop_dangling_active();
        debug!(cassettes = store.doc.cassettes.len(), "library loaded");
        store
    }

    // ===== Queries =====

    /// All cassettes in storage order
    pub fn cassettes(&self) -> &[Cassette] {
        &self.doc.cassettes
    }

    pub fn get_cassette(&self, id: &CassetteId) -> Option<&Cassette> {
        self.doc.cassettes.iter().find(|c| &c.id == id)
    }

    pub fn active_cassette(&self) -> Option<&Cassette> {
        self.doc
            .active_cassette_id
            .as_ref()
            .and_then(|id| self.get_cassette(id))
    }

    /// Most recently played cassette
    ///
    /// Falls back to the first cassette when none has been played yet.
    pub fn last_played(&self) -> Option<&Cassette> {
        self.doc
            .cassettes
            .iter()
            .filter(|c| c.last_played_at.is_some())
            .max_by_key(|c| c.last_played_at)
            .or_else(|| self.doc.cassettes.first())
    }

    pub fn len(&self) -> usize {
        self.doc.cassettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.cassettes.is_empty()
    }

    // ===== Cassette Management =====

    /// Create a cassette and return it
    pub fn add_cassette(&mut self, new: NewCassette) -> Result<Cassette> {
        let cassette = Cassette::from_new(CassetteId::generate(), new, Utc::now());
        info!(cassette_id = %cassette.id, name = %cassette.name, "cassette added");
        self.doc.cassettes.push(cassette.clone());
        self.persist()?;
        Ok(cassette)
    }

    /// Delete a cassette; unmounts it if it was mounted
    pub fn remove_cassette(&mut self, id: &CassetteId) -> Result<bool> {
        let before = self.doc.cassettes.len();
        self.doc.cassettes.retain(|c| &c.id != id);
        if self.doc.cassettes.len() == before {
            return Ok(false);
        }

        if self.doc.active_cassette_id.as_ref() == Some(id) {
            self.doc.active_cassette_id = None;
        }
        info!(cassette_id = %id, "cassette removed");
        self.persist()?;
        Ok(true)
    }

    /// Apply a partial update
    pub fn update_cassette(&mut self, id: &CassetteId, update: CassetteUpdate) -> Result<Cassette> {
        let cassette = self.find_mut(id)?;
        cassette.apply(update);
        let updated = cassette.clone();
        self.persist()?;
        Ok(updated)
    }

    pub fn rename_cassette(&mut self, id: &CassetteId, name: impl Into<String>) -> Result<Cassette> {
        self.update_cassette(
            id,
            CassetteUpdate {
                name: Some(name.into()),
                ..Default::default()
            },
        )
    }

    /// Mount a cassette and return it
    pub fn load_cassette(&mut self, id: &CassetteId) -> Result<Cassette> {
        let cassette = self
            .get_cassette(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Cassette", id.as_str()))?;
        self.doc.active_cassette_id = Some(id.clone());
        self.persist()?;
        Ok(cassette)
    }

    /// Remove every cassette and unmount
    pub fn clear_library(&mut self) -> Result<()> {
        self.doc = LibraryDocument::default();
        info!("library cleared");
        self.persist()
    }

    // ===== Internals =====

    fn find_mut(&mut self, id: &CassetteId) -> std::result::Result<&mut Cassette, StorageError> {
        self.doc
            .cassettes
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StorageError::not_found("Cassette", id.as_str()))
    }

    fn drop_dangling_active(&mut self) {
        let dangling = self
            .doc
            .active_cassette_id
            .as_ref()
            .is_some_and(|id| self.get_cassette(id).is_none());
        if dangling {
            debug!("active cassette no longer exists, unmounting");
            self.doc.active_cassette_id = None;
        }
    }

    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.doc)?;
        self.gateway.set(LIBRARY_KEY, &bytes)
    }
}

impl PlaybackMemory for MemoryStore {
    fn update_playback_memory(
        &mut self,
        cassette_id: &CassetteId,
        track_id: &TrackId,
        position: f64,
    ) -> Result<()> {
        let position = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };

        let cassette = self.find_mut(cassette_id)?;
        cassette.last_played_track_id = Some(track_id.clone());
        cassette.last_position = Some(position);
        cassette.last_played_at = Some(Utc::now());
        self.persist()
    }

    fn last_played_cassette(&self) -> Option<Cassette> {
        self.last_played().cloned()
    }

    fn active_cassette_id(&self) -> Option<CassetteId> {
        self.doc.active_cassette_id.clone()
    }

    fn set_active_cassette(&mut self, id: Option<CassetteId>) -> Result<()> {
        if let Some(id) = &id {
            if self.get_cassette(id).is_none() {
                return Err(StorageError::not_found("Cassette", id.as_str()).into());
            }
        }
        self.doc.active_cassette_id = id;
        self.persist()
    }

    fn cassette(&self, id: &CassetteId) -> Option<Cassette> {
        self.get_cassette(id).cloned()
    }
}
