mod cassette;
mod ids;
mod playback_state;
mod track;

pub use cassette::{Cassette, CassetteUpdate, NewCassette};
pub use ids::{CassetteId, TrackId};
pub use playback_state::{PersistedSession, RepeatMode, MAX_RATE, MIN_RATE};
pub use track::{Track, DEFAULT_ACCENT_COLOR};
