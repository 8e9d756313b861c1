/// Track domain type
use super::ids::TrackId;
use serde::{Deserialize, Serialize};

/// Accent color used when a track does not provide one
pub const DEFAULT_ACCENT_COLOR: &str = "#666666";

/// Audio track
///
/// Immutable once created; two tracks are the same track when their ids match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Opaque audio source, resolved by the engine (path, URI or asset key)
    pub audio_source: String,

    /// Artwork source (opaque, resolved by the presentation layer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,

    /// Accent color (hex string)
    #[serde(default = "default_accent_color")]
    pub accent_color: String,

    /// Genre
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    /// Release year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,

    /// Duration in seconds, when known ahead of decoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<f64>,
}

fn default_accent_color() -> String {
    DEFAULT_ACCENT_COLOR.to_string()
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio_source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            audio_source: audio_source.into(),
            artwork: None,
            accent_color: default_accent_color(),
            genre: None,
            year: None,
            album_name: None,
            duration_hint: None,
        }
    }

    /// Set the accent color
    #[must_use]
    pub fn with_accent_color(mut self, color: impl Into<String>) -> Self {
        self.accent_color = color.into();
        self
    }

    /// Set the artwork source
    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    /// Set the duration hint in seconds
    #[must_use]
    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    /// Display title, falling back when the tag is empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Display artist, falling back when the tag is empty
    pub fn display_artist(&self) -> &str {
        if self.artist.is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        }
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        TrackId::new(id)
    }
}
