//! Cassette Deck Core
//!
//! Platform-agnostic domain types, collaborator traits, and error handling
//! shared by the deck crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Cassette`, `RepeatMode`, `PersistedSession`
//! - **Engine Traits**: `AudioEngine`, `EffectBackend`
//! - **Storage Traits**: `PersistenceGateway`, `PlaybackMemory`, `SessionStore`
//! - **Error Handling**: Unified `CassetteError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cassette_core::types::{Track, RepeatMode};
//!
//! let track = Track::new("1", "Timeless", "The Weeknd", "mp3s/Timeless.mp3")
//!     .with_accent_color("#7E57FF");
//!
//! assert_eq!(track.display_title(), "Timeless");
//! assert_eq!(RepeatMode::default(), RepeatMode::Off);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CassetteError, Result};
pub use storage::{PersistenceGateway, PlaybackMemory, SessionStore};
pub use traits::{
    AudioEngine, EffectBackend, EffectId, EffectStatus, EngineCapabilities, EngineHandle,
    EngineStatus, StatusUpdate,
};

pub use types::{
    Cassette, CassetteId, CassetteUpdate, NewCassette, PersistedSession, RepeatMode, Track,
    TrackId,
};
