//! Error types for playback management
//!
//! Commands never return errors to the caller. Load and play failures are
//! recorded in the session as a `SessionError` so the presentation layer can
//! render them with a retry affordance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cassette_core::{CassetteError, Result};

/// Error visible in the playback session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    /// Decode or source resolution failed; retry by loading the same track
    #[error("Failed to load track: {0}")]
    Load(String),

    /// The engine rejected a transport command
    #[error("Playback failed: {0}")]
    Play(String),
}

impl SessionError {
    /// Whether re-loading the current track may fix this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}
