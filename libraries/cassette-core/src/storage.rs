//! Storage traits
//!
//! Playback never talks to a concrete store. These traits are the narrow
//! interfaces the deck is given at composition time.

use crate::error::Result;
use crate::types::{Cassette, CassetteId, PersistedSession, TrackId};
use std::sync::Arc;

/// Durable key-value storage
///
/// Implementations must degrade to in-memory operation rather than fail hard
/// when the backing store is unavailable.
pub trait PersistenceGateway: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    fn remove(&self, key: &str) -> Result<()>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Arc<G> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Per-cassette resume bookmarks and the mounted cassette
pub trait PlaybackMemory: Send {
    /// Record the bookmark for a cassette and stamp it with the current time
    fn update_playback_memory(
        &mut self,
        cassette_id: &CassetteId,
        track_id: &TrackId,
        position: f64,
    ) -> Result<()>;

    /// Most recently played cassette, else the first one, else `None`
    fn last_played_cassette(&self) -> Option<Cassette>;

    /// Cassette mounted in this session
    fn active_cassette_id(&self) -> Option<CassetteId>;

    /// Mount (or unmount with `None`) a cassette
    fn set_active_cassette(&mut self, id: Option<CassetteId>) -> Result<()>;

    /// Look up a cassette
    fn cassette(&self, id: &CassetteId) -> Option<Cassette>;
}

/// Persistence of the session subset that survives restarts
pub trait SessionStore: Send {
    /// Load the last saved session
    fn load_session(&self) -> Result<Option<PersistedSession>>;

    /// Save the session
    fn save_session(&mut self, session: &PersistedSession) -> Result<()>;
}
