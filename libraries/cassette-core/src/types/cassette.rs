//! Cassette types
//!
//! A cassette is a named, durable track collection carrying a resume bookmark.
//! It is independent of the live queue: mounting a cassette copies its tracks
//! into the queue, and playback writes the bookmark back.

use super::ids::{CassetteId, TrackId};
use super::track::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable named track collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cassette {
    pub id: CassetteId,
    pub name: String,
    pub tracks: Vec<Track>,
    pub accent_color: String,
    pub created_at: DateTime<Utc>,

    /// Track that was playing at the last checkpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_track_id: Option<TrackId>,

    /// Position within that track, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_position: Option<f64>,

    /// When the bookmark was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<DateTime<Utc>>,
}

impl Cassette {
    /// Build a cassette from creation data
    pub fn from_new(id: CassetteId, new: NewCassette, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            tracks: new.tracks,
            accent_color: new.accent_color,
            created_at,
            last_played_track_id: None,
            last_position: None,
            last_played_at: None,
        }
    }

    /// Resume bookmark, if this cassette has been played
    pub fn bookmark(&self) -> Option<(&TrackId, f64)> {
        self.last_played_track_id
            .as_ref()
            .map(|id| (id, self.last_position.unwrap_or(0.0)))
    }

    /// Index of a track within this cassette
    pub fn track_index(&self, track_id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == track_id)
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: CassetteUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(tracks) = update.tracks {
            self.tracks = tracks;
        }
        if let Some(color) = update.accent_color {
            self.accent_color = color;
        }
    }
}

/// Data for creating a new cassette
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCassette {
    pub name: String,
    pub tracks: Vec<Track>,
    pub accent_color: String,
}

/// Partial cassette update (only provided fields change)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CassetteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}
