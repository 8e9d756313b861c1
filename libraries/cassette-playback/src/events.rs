//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are queued in
//! the order the deck produced them and drained by the presentation layer:
//! - State changes (loading/paused/playing/errored)
//! - Track changes and natural track completion
//! - Position updates after seeks
//! - Power, volume, rate, and queue changes

use crate::types::PlayerState;
use cassette_core::{CassetteId, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Player state changed
    StateChanged {
        /// The new state
        state: PlayerState,
    },

    /// A different track was bound
    TrackChanged {
        /// ID of the new track
        track_id: TrackId,
        /// ID of the track it replaced (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track reached its end, naturally or by fast-forward
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Position jumped (seek, rewind, restart)
    PositionUpdate {
        /// Position in seconds
        position: f64,
        /// Duration in seconds
        duration: f64,
    },

    /// Power flag changed
    PowerChanged {
        /// New power state
        on: bool,
    },

    /// Volume intent changed
    VolumeChanged {
        /// New volume (0.0 - 1.0)
        volume: f32,
        /// Whether the engine applied it
        applied: bool,
    },

    /// Rate intent changed
    RateChanged {
        /// New rate (0.5 - 2.0)
        rate: f32,
        /// Whether the engine applied it
        applied: bool,
    },

    /// Queue contents, index, or policy changed
    QueueChanged {
        /// New queue length
        length: usize,
        /// Current index
        current_index: usize,
    },

    /// A cassette was mounted or ejected
    CassetteChanged {
        /// Mounted cassette, `None` after eject
        cassette_id: Option<CassetteId>,
    },

    /// Load or playback failed
    Error {
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Whether this event should trigger a re-render of the transport controls
    pub fn affects_transport(&self) -> bool {
        matches!(
            self,
            Self::StateChanged { .. }
                | Self::TrackChanged { .. }
                | Self::TrackFinished { .. }
                | Self::PowerChanged { .. }
                | Self::Error { .. }
        )
    }
}
