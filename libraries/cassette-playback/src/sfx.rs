//! Sound effects
//!
//! Short cosmetic clips (insert, eject, button clicks) played on a backend
//! separate from the main engine. At most one instance exists per clip key:
//! a repeated request while the clip is scheduled or still playing is
//! dropped, which keeps rapid button mashing from piling up decoders.
//!
//! Effects are driven by `poll`, which starts due instances and releases the
//! ones that finished.

use cassette_core::{EffectBackend, EffectId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Clips used by the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Insert,
    Eject,
    Click,
    Rewind,
    FastForward,
}

impl SoundEffect {
    pub fn clip_id(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Eject => "eject",
            Self::Click => "click",
            Self::Rewind => "rewind",
            Self::FastForward => "fastforward",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Scheduled { due: Instant },
    Live(EffectId),
}

/// One-instance-per-key effect player
pub struct SoundEffectPlayer {
    backend: Box<dyn EffectBackend>,
    sources: HashMap<String, String>,
    slots: HashMap<String, Slot>,
}

impl SoundEffectPlayer {
    pub fn new(backend: Box<dyn EffectBackend>) -> Self {
        Self {
            backend,
            sources: HashMap::new(),
            slots: HashMap::new(),
        }
    }

    /// Map a clip key to the source handed to the backend
    ///
    /// Unmapped keys are passed through unchanged.
    #[must_use]
    pub fn with_source(mut self, clip_id: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(clip_id.into(), source.into());
        self
    }

    /// Play a named deck effect
    pub fn play(&mut self, effect: SoundEffect, delay: Duration, now: Instant) {
        self.play_effect(effect.clip_id(), delay, now);
    }

    /// Play `clip_id` after `delay`
    ///
    /// Dropped when an instance for the key is scheduled or still playing.
    /// Failures are logged and swallowed.
    pub fn play_effect(&mut self, clip_id: &str, delay: Duration, now: Instant) {
        match self.slots.get(clip_id).copied() {
            Some(Slot::Scheduled { .. }) => {
                debug!(clip_id, "effect already scheduled, dropping request");
                return;
            }
            Some(Slot::Live(id)) => {
                let status = self.backend.status(id);
                if status.loaded && status.playing {
                    debug!(clip_id, "effect still playing, dropping request");
                    return;
                }
                self.backend.release(id);
                self.slots.remove(clip_id);
            }
            None => {}
        }

        if delay.is_zero() {
            self.start(clip_id);
        } else {
            self.slots
                .insert(clip_id.to_string(), Slot::Scheduled { due: now + delay });
        }
    }

    /// Start due effects and release finished ones
    pub fn poll(&mut self, now: Instant) {
        let due: Vec<String> = self
            .slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Scheduled { due } if *due <= now => Some(key.clone()),
                _ => None,
            })
            .collect();
        for key in due {
            self.slots.remove(&key);
            self.start(&key);
        }

        let finished: Vec<(String, EffectId)> = self
            .slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Live(id) if self.backend.status(*id).is_finished() => {
                    Some((key.clone(), *id))
                }
                _ => None,
            })
            .collect();
        for (key, id) in finished {
            debug!(clip_id = %key, "effect finished");
            self.backend.release(id);
            self.slots.remove(&key);
        }
    }

    /// Release every instance and drop pending schedules
    pub fn release_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            if let Slot::Live(id) = slot {
                self.backend.release(id);
            }
        }
    }

    /// Whether the key has a started instance
    pub fn is_live(&self, clip_id: &str) -> bool {
        matches!(self.slots.get(clip_id), Some(Slot::Live(_)))
    }

    /// Whether the key is waiting for its delay
    pub fn is_scheduled(&self, clip_id: &str) -> bool {
        matches!(self.slots.get(clip_id), Some(Slot::Scheduled { .. }))
    }

    pub fn live_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }

    fn start(&mut self, clip_id: &str) {
        let source = self
            .sources
            .get(clip_id)
            .map_or(clip_id, String::as_str)
            .to_string();

        let id = match self.backend.create(&source) {
            Ok(id) => id,
            Err(e) => {
                warn!(clip_id, error = %e, "failed to create sound effect");
                return;
            }
        };

        if let Err(e) = self.backend.play(id) {
            warn!(clip_id, error = %e, "failed to play sound effect");
            self.backend.release(id);
            return;
        }

        self.slots.insert(clip_id.to_string(), Slot::Live(id));
    }
}

impl Drop for SoundEffectPlayer {
    fn drop(&mut self) {
        self.release_all();
    }
}
