/// Engine-facing traits for the cassette deck
///
/// The deck never decodes audio itself. Platforms provide an `AudioEngine`
/// for the primary track and an `EffectBackend` for short one-shot clips.
use crate::error::{CassetteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of one decoded audio source bound to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Wrap a raw engine handle value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status reported by the engine for one handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Whether audio is currently being output
    pub playing: bool,

    /// Position in seconds
    pub current_time: f64,

    /// Duration in seconds (0 until known)
    pub duration: f64,

    /// Whether the decode finished and the handle accepts seeks
    pub loaded: bool,

    /// Decode or playback failure
    pub error: Option<String>,
}

/// One entry of the engine status feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub handle: EngineHandle,
    pub status: EngineStatus,
}

impl StatusUpdate {
    pub fn new(handle: EngineHandle, status: EngineStatus) -> Self {
        Self { handle, status }
    }
}

/// Optional controls an engine may offer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCapabilities {
    pub volume: bool,
    pub rate: bool,
}

impl EngineCapabilities {
    /// Engine with every optional control
    pub const fn full() -> Self {
        Self {
            volume: true,
            rate: true,
        }
    }
}

/// Primary playback engine
///
/// `load` returns immediately with a handle; readiness (or a decode error) is
/// reported later through the status feed as a [`StatusUpdate`]. Seeking a
/// handle before it reported `loaded` is undefined, so callers must not do it.
///
/// After `release`, the engine must not report further statuses for the
/// handle that matter to anyone: the deck ignores them by identity anyway.
pub trait AudioEngine: Send {
    /// Optional controls supported by this engine
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities::default()
    }

    /// Begin loading a source
    ///
    /// # Errors
    /// Returns an error if the source cannot even be submitted for decoding
    fn load(&mut self, source: &str) -> Result<EngineHandle>;

    /// Release a handle and free its decoder resources
    fn release(&mut self, handle: EngineHandle);

    /// Start or resume output
    fn play(&mut self, handle: EngineHandle) -> Result<()>;

    /// Pause output
    fn pause(&mut self, handle: EngineHandle) -> Result<()>;

    /// Seek to an absolute position in seconds
    fn seek(&mut self, handle: EngineHandle, seconds: f64) -> Result<()>;

    /// Set output volume (0.0 - 1.0)
    fn set_volume(&mut self, handle: EngineHandle, volume: f32) -> Result<()> {
        let _ = (handle, volume);
        Err(CassetteError::Unsupported("volume"))
    }

    /// Set playback rate (0.5 - 2.0)
    fn set_rate(&mut self, handle: EngineHandle, rate: f32) -> Result<()> {
        let _ = (handle, rate);
        Err(CassetteError::Unsupported("rate"))
    }
}

/// Identity of one sound effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

/// Status of a sound effect instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectStatus {
    pub loaded: bool,
    pub playing: bool,
}

impl EffectStatus {
    /// Loaded but no longer playing
    pub fn is_finished(self) -> bool {
        self.loaded && !self.playing
    }
}

/// Backend for short one-shot clips, disjoint from the primary engine
pub trait EffectBackend: Send {
    /// Load a clip and return its instance
    fn create(&mut self, clip: &str) -> Result<EffectId>;

    /// Play a created instance
    fn play(&mut self, id: EffectId) -> Result<()>;

    /// Current status of an instance
    fn status(&self, id: EffectId) -> EffectStatus;

    /// Unload an instance
    fn release(&mut self, id: EffectId);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareEngine;

    impl AudioEngine for BareEngine {
        fn load(&mut self, _source: &str) -> Result<EngineHandle> {
            Ok(EngineHandle::new(1))
        }
        fn release(&mut self, _handle: EngineHandle) {}
        fn play(&mut self, _handle: EngineHandle) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self, _handle: EngineHandle) -> Result<()> {
            Ok(())
        }
        fn seek(&mut self, _handle: EngineHandle, _seconds: f64) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn optional_controls_default_to_unsupported() {
        let mut engine = BareEngine;
        assert_eq!(engine.capabilities(), EngineCapabilities::default());
        let handle = engine.load("a.mp3").unwrap();
        assert!(matches!(
            engine.set_volume(handle, 0.5),
            Err(CassetteError::Unsupported("volume"))
        ));
        assert!(matches!(
            engine.set_rate(handle, 1.5),
            Err(CassetteError::Unsupported("rate"))
        ));
    }

    #[test]
    fn effect_finished_means_loaded_and_stopped() {
        assert!(EffectStatus {
            loaded: true,
            playing: false
        }
        .is_finished());
        assert!(!EffectStatus::default().is_finished());
    }
}
