/// Core error types for the cassette deck
use thiserror::Error;

/// Result type alias using `CassetteError`
pub type Result<T> = std::result::Result<T, CassetteError>;

/// Core error type shared by the deck crates
#[derive(Error, Debug)]
pub enum CassetteError {
    /// Decode or source resolution failed
    #[error("Load error: {0}")]
    Load(String),

    /// Engine rejected an operation in its current state
    #[error("Play error: {0}")]
    Play(String),

    /// Durable read/write failed (never fatal)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Sound effect failure (cosmetic)
    #[error("Sound effect error: {0}")]
    Sfx(String),

    /// Engine does not offer the requested capability
    #[error("Unsupported capability: {0}")]
    Unsupported(&'static str),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CassetteError {
    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a play error
    pub fn play(msg: impl Into<String>) -> Self {
        Self::Play(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a sound effect error
    pub fn sfx(msg: impl Into<String>) -> Self {
        Self::Sfx(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}
