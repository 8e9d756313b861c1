//! Core types for playback management

use crate::error::SessionError;
use cassette_core::{CassetteId, RepeatMode, Track};
use serde::{Deserialize, Serialize};

/// Lifecycle of the primary track
///
/// Power is orthogonal: it gates which commands are accepted, it is not a
/// state of this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// No track bound
    #[default]
    Idle,

    /// Track bound, waiting for the engine to report it loaded
    Loading,

    /// Loaded and paused
    ReadyPaused,

    /// Loaded and playing
    ReadyPlaying,

    /// Load or playback failed; reload the track to retry
    Errored,
}

impl PlayerState {
    /// Whether the engine has a decoded resource ready for transport commands
    pub fn is_ready(self) -> bool {
        matches!(self, Self::ReadyPaused | Self::ReadyPlaying)
    }
}

/// Live playback session
///
/// `is_playing`, `current_time`, and `duration` mirror the engine's latest
/// status; `current_track` changes only through `load_track`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub current_track: Option<Track>,
    pub state: PlayerState,
    pub is_playing: bool,
    pub power_on: bool,

    /// Volume intent (0.0 - 1.0), kept even when the engine cannot apply it
    pub volume: f32,

    /// Rate intent (0.5 - 2.0), kept even when the engine cannot apply it
    pub rate: f32,

    /// Position in seconds
    pub current_time: f64,

    /// Duration in seconds (0 until known)
    pub duration: f64,

    pub last_error: Option<SessionError>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_track: None,
            state: PlayerState::Idle,
            is_playing: false,
            power_on: true,
            volume: 1.0,
            rate: 1.0,
            current_time: 0.0,
            duration: 0.0,
            last_error: None,
        }
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub session: PlaybackSession,
    pub queue: Vec<Track>,
    pub current_index: usize,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub active_cassette_id: Option<CassetteId>,

    /// Normalized progress (0.0 - 1.0)
    pub progress: f64,

    /// "m:ss / m:ss"
    pub formatted_time: String,
}
