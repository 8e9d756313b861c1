//! Playback queue
//!
//! Ordered list of tracks with a cursor and the shuffle/repeat policy.
//!
//! ```text
//!   [ A ][ B ][ C ][ D ]
//!          ^ current_index
//!
//!   play_next      C (or A under RepeatMode::All at the end)
//!   play_previous  A (wraps to D from the front, whatever the repeat mode)
//! ```
//!
//! The queue never talks to the engine. Navigation that lands on a track
//! hands it to a [`TrackLoader`], which the deck wires to the playback
//! controller.

use crate::shuffle::{random_index, shuffle_in_place};
use cassette_core::{RepeatMode, Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Receives the track the queue navigated to
pub trait TrackLoader {
    /// Bind and start loading `track`
    fn load_track(&mut self, track: Track);
}

/// Queue with cursor and playback policy
#[derive(Debug, Clone)]
pub struct QueueManager {
    tracks: Vec<Track>,
    current_index: usize,
    shuffle_enabled: bool,
    repeat_mode: RepeatMode,
    rng: StdRng,
}

impl QueueManager {
    /// Create an empty queue seeded from entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue with a fixed shuffle seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            current_index: 0,
            shuffle_enabled: false,
            repeat_mode: RepeatMode::Off,
            rng,
        }
    }

    // ===== Contents =====

    /// Append a track to the end
    pub fn add_to_playlist(&mut self, track: Track) {
        debug!(track_id = %track.id, "track appended to queue");
        self.tracks.push(track);
    }

    /// Remove every track with the given id
    ///
    /// The cursor is not moved to follow the current track. It is only pulled
    /// back to the last slot when the removal leaves it past the end.
    pub fn remove_from_playlist(&mut self, track_id: &TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| &t.id != track_id);
        let removed = self.tracks.len() != before;

        if self.current_index >= self.tracks.len() {
            self.current_index = self.tracks.len().saturating_sub(1);
        }
        removed
    }

    /// Remove all tracks and reset the cursor
    pub fn clear_playlist(&mut self) {
        self.tracks.clear();
        self.current_index = 0;
    }

    /// Insert a track right after the current one
    pub fn enqueue_next(&mut self, track: Track) {
        let position = if self.tracks.is_empty() {
            0
        } else {
            (self.current_index + 1).min(self.tracks.len())
        };
        self.tracks.insert(position, track);
    }

    /// Replace the contents and reset the cursor to 0
    ///
    /// Does not load anything; the caller decides whether to start playback.
    pub fn load_playlist(&mut self, tracks: Vec<Track>) {
        debug!(len = tracks.len(), "queue replaced");
        self.tracks = tracks;
        self.current_index = 0;
    }

    /// Shuffle the contents in place and reset the cursor to 0
    pub fn shuffle_playlist(&mut self) {
        shuffle_in_place(&mut self.tracks, &mut self.rng);
        self.current_index = 0;
    }

    // ===== Policy =====

    /// Flip the shuffle flag (order is left as is)
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle_enabled = !self.shuffle_enabled;
        self.shuffle_enabled
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle_enabled = enabled;
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    // ===== Navigation =====

    /// Advance per shuffle/repeat policy and load the resulting track
    ///
    /// Returns `false` without touching anything when the queue is empty or
    /// the end is reached with repeat off.
    pub fn play_next(&mut self, loader: &mut impl TrackLoader) -> bool {
        let Some(index) = self.next_index() else {
            return false;
        };
        self.load_at(index, loader)
    }

    /// Step back one track, wrapping from the front to the last track
    ///
    /// Wraps regardless of repeat mode.
    pub fn play_previous(&mut self, loader: &mut impl TrackLoader) -> bool {
        if self.tracks.is_empty() {
            return false;
        }
        let index = if self.current_index == 0 {
            self.tracks.len() - 1
        } else {
            self.current_index - 1
        };
        self.load_at(index, loader)
    }

    /// Jump to an absolute position; out of range is ignored
    pub fn jump_to_track(&mut self, index: usize, loader: &mut impl TrackLoader) -> bool {
        if index >= self.tracks.len() {
            debug!(index, len = self.tracks.len(), "jump out of range ignored");
            return false;
        }
        self.load_at(index, loader)
    }

    /// Move the cursor without loading
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index >= self.tracks.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    fn next_index(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        if self.shuffle_enabled {
            return random_index(self.tracks.len(), &mut self.rng);
        }

        let next = self.current_index + 1;
        if next < self.tracks.len() {
            Some(next)
        } else if self.repeat_mode == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn load_at(&mut self, index: usize, loader: &mut impl TrackLoader) -> bool {
        let Some(track) = self.tracks.get(index).cloned() else {
            return false;
        };
        self.current_index = index;
        loader.load_track(track);
        true
    }

    // ===== Queries =====

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// Track after the cursor in queue order (no wrap)
    pub fn peek_next(&self) -> Option<&Track> {
        self.tracks.get(self.current_index + 1)
    }

    /// Track before the cursor, wrapping like `play_previous`
    pub fn peek_previous(&self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let index = if self.current_index == 0 {
            self.tracks.len() - 1
        } else {
            self.current_index - 1
        };
        self.tracks.get(index)
    }

    /// "3 / 12" style position, 1-based
    pub fn position_label(&self) -> String {
        if self.tracks.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.current_index + 1, self.tracks.len())
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}
