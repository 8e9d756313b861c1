//! Cassette Deck - Playback Management
//!
//! Platform-agnostic playback control for a single-track cassette deck.
//!
//! This crate provides:
//! - Playback controller (one decoded resource, async load lifecycle)
//! - Queue with shuffle and repeat policy
//! - One-instance-per-key sound effects
//! - Resume bookmarks and session persistence (through storage traits)
//! - A tokio driver for the engine status feed and periodic ticks
//!
//! # Architecture
//!
//! `cassette-playback` never touches audio or storage directly:
//! - Audio output and decoding come in through `AudioEngine`
//! - Sound effects come in through `EffectBackend`
//! - Bookmarks and sessions come in through `PlaybackMemory` / `SessionStore`
//!
//! All of these live in `cassette-core`; concrete implementations are wired
//! at composition time.
//!
//! # Example
//!
//! ```rust
//! use cassette_core::{AudioEngine, EngineHandle, EngineStatus, Result, StatusUpdate, Track};
//! use cassette_playback::{Deck, DeckConfig, PlayerState};
//!
//! struct SilentEngine;
//!
//! impl AudioEngine for SilentEngine {
//!     fn load(&mut self, _source: &str) -> Result<EngineHandle> {
//!         Ok(EngineHandle::new(1))
//!     }
//!     fn release(&mut self, _handle: EngineHandle) {}
//!     fn play(&mut self, _handle: EngineHandle) -> Result<()> {
//!         Ok(())
//!     }
//!     fn pause(&mut self, _handle: EngineHandle) -> Result<()> {
//!         Ok(())
//!     }
//!     fn seek(&mut self, _handle: EngineHandle, _seconds: f64) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut deck = Deck::new(Box::new(SilentEngine), DeckConfig::default());
//! deck.load_playlist(vec![Track::new("1", "Timeless", "The Weeknd", "Timeless.mp3")]);
//! deck.jump_to_track(0);
//! deck.play();
//! assert_eq!(deck.controller().state(), PlayerState::Loading);
//!
//! // The engine reports the track decoded
//! deck.handle_status(StatusUpdate::new(
//!     EngineHandle::new(1),
//!     EngineStatus { loaded: true, duration: 200.0, ..Default::default() },
//! ));
//! assert!(deck.controller().is_playing());
//! ```

pub mod config;
pub mod controller;
pub mod deck;
pub mod driver;
pub mod error;
pub mod events;
pub mod queue;
pub mod sfx;
pub mod shuffle;
pub mod types;

pub use config::DeckConfig;
pub use controller::{format_time, PlaybackController, SeekOutcome, StatusOutcome};
pub use deck::Deck;
pub use driver::DriverHandle;
pub use error::{CassetteError, Result, SessionError};
pub use events::PlaybackEvent;
pub use queue::{QueueManager, TrackLoader};
pub use sfx::{SoundEffect, SoundEffectPlayer};
pub use types::{DeckSnapshot, PlaybackSession, PlayerState};
