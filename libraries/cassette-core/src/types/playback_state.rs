/// Playback policy types and the persisted session subset
use super::ids::CassetteId;
use super::track::Track;
use serde::{Deserialize, Serialize};

/// Lowest accepted playback rate
pub const MIN_RATE: f32 = 0.5;

/// Highest accepted playback rate
pub const MAX_RATE: f32 = 2.0;

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop on the last track
    #[default]
    Off,
    /// Wrap from the last track to the first
    All,
    /// Restart the current track when it ends
    One,
}

impl RepeatMode {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" | "none" => Some(Self::Off),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }

    /// Next mode in the off -> all -> one cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session state that survives a restart
///
/// Live engine handles and transient fields (playing, current time) are
/// deliberately absent: they always come back as idle / zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub queue: Vec<Track>,
    pub current_index: usize,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    pub power_on: bool,
    pub volume: f32,
    pub rate: f32,
    pub active_cassette_id: Option<CassetteId>,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            current_index: 0,
            shuffle_enabled: false,
            repeat_mode: RepeatMode::Off,
            power_on: true,
            volume: 1.0,
            rate: 1.0,
            active_cassette_id: None,
        }
    }
}
