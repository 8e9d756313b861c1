//! Deck
//!
//! Composes the playback controller, the queue, sound effects, and the
//! storage collaborators into the command surface the presentation layer
//! talks to. Every command is a `&mut self` method, so commands are applied
//! one at a time in arrival order.
//!
//! The deck owns the policies that span components:
//! - auto-advance on natural end of track (repeat one, repeat all, shuffle)
//! - resume bookmark checkpoints (periodic while playing, and on pause)
//! - session persistence and resume on start
//! - the insert / eject cassette flow

use crate::config::DeckConfig;
use crate::controller::{PlaybackController, SeekOutcome, StatusOutcome};
use crate::events::PlaybackEvent;
use crate::queue::QueueManager;
use crate::sfx::{SoundEffect, SoundEffectPlayer};
use crate::types::{DeckSnapshot, PlayerState};
use cassette_core::{
    AudioEngine, CassetteError, CassetteId, PersistedSession, PlaybackMemory, RepeatMode, Result,
    SessionStore, StatusUpdate, Track, TrackId,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The cassette deck
pub struct Deck {
    controller: PlaybackController,
    queue: QueueManager,
    effects: Option<SoundEffectPlayer>,
    memory: Option<Box<dyn PlaybackMemory>>,
    sessions: Option<Box<dyn SessionStore>>,
    config: DeckConfig,

    active_cassette_id: Option<CassetteId>,
    last_checkpoint: Option<Instant>,
    session_dirty: bool,
}

impl Deck {
    /// Create a deck around an engine
    pub fn new(engine: Box<dyn AudioEngine>, config: DeckConfig) -> Self {
        let mut controller =
            PlaybackController::new(engine).with_load_timeout(config.load_timeout());
        controller.set_volume(config.initial_volume);
        controller.set_playback_rate(config.initial_rate);
        controller.drain_events();

        let queue = config
            .shuffle_seed
            .map_or_else(QueueManager::new, QueueManager::with_seed);

        Self {
            controller,
            queue,
            effects: None,
            memory: None,
            sessions: None,
            config,
            active_cassette_id: None,
            last_checkpoint: None,
            session_dirty: false,
        }
    }

    /// Attach the cassette library used for resume bookmarks
    #[must_use]
    pub fn with_memory(mut self, memory: Box<dyn PlaybackMemory>) -> Self {
        self.active_cassette_id = memory.active_cassette_id();
        self.memory = Some(memory);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: SoundEffectPlayer) -> Self {
        self.effects = Some(effects);
        self
    }

    #[must_use]
    pub fn with_session_store(mut self, sessions: Box<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    // ===== Startup / Shutdown =====

    /// Restore the previous session, or resume the last played cassette
    pub fn start(&mut self) {
        if self.restore_session() && !self.queue.is_empty() {
            self.load_current_from_bookmark();
        } else {
            self.resume_on_start();
        }
    }

    /// Resume the most recently played cassette
    ///
    /// Only runs when nothing is loaded yet. Queues the cassette's tracks,
    /// marks it active, and loads the bookmarked track with the seek deferred
    /// until the engine reports it loaded. Without a bookmark the first track
    /// is loaded at 0.
    pub fn resume_on_start(&mut self) -> bool {
        if self.controller.current_track().is_some() || !self.queue.is_empty() {
            debug!("deck already has content, skipping resume");
            return false;
        }

        let Some(cassette) = self.memory.as_ref().and_then(|m| m.last_played_cassette()) else {
            debug!("no cassette to resume");
            return false;
        };
        if cassette.tracks.is_empty() {
            return false;
        }

        let bookmark = cassette.bookmark().and_then(|(track_id, position)| {
            cassette.track_index(track_id).map(|index| (index, position))
        });

        info!(cassette_id = %cassette.id, has_bookmark = bookmark.is_some(), "resuming cassette");

        self.queue.load_playlist(cassette.tracks.clone());
        self.set_active(Some(cassette.id));

        match bookmark {
            Some((index, position)) => {
                self.queue.set_current_index(index);
                self.load_current();
                self.controller.defer_seek(position);
            }
            None => self.load_current(),
        }

        self.queue_changed();
        true
    }

    /// Flush state and release every resource
    pub fn shutdown(&mut self) {
        self.checkpoint(Instant::now());
        self.persist_session();
        if let Some(effects) = self.effects.as_mut() {
            effects.release_all();
        }
        self.controller.unload();
        info!("deck shut down");
    }

    // ===== Transport =====

    pub fn load_track(&mut self, track: Track) {
        self.controller.load_track(track);
    }

    pub fn play(&mut self) {
        self.controller.play();
    }

    /// Pause and checkpoint the position
    pub fn pause(&mut self) {
        let was_playing = self.controller.is_playing();
        self.controller.pause();
        if was_playing {
            self.checkpoint(Instant::now());
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if !self.controller.can_interact() {
            return;
        }
        self.play_effect(SoundEffect::Click, Duration::ZERO);
        if self.controller.is_playing() || self.controller.play_pending() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek_to(&mut self, seconds: f64) {
        self.controller.seek_to(seconds);
    }

    /// Rewind by the configured step
    pub fn rewind(&mut self) {
        if !self.controller.can_interact() {
            return;
        }
        self.play_effect(SoundEffect::Rewind, Duration::ZERO);
        self.controller.rewind(self.config.seek_step_secs);
    }

    /// Fast-forward by the configured step
    pub fn fast_forward(&mut self) {
        if !self.controller.can_interact() {
            return;
        }
        self.play_effect(SoundEffect::FastForward, Duration::ZERO);
        if let SeekOutcome::Finished { was_playing } =
            self.controller.fast_forward(self.config.seek_step_secs)
        {
            self.on_track_finished(was_playing);
            self.controller.settle_state();
        }
    }

    pub fn restart_track(&mut self) {
        self.controller.restart_track();
    }

    /// Switch power; turning off pauses and checkpoints first
    pub fn set_power_state(&mut self, on: bool) {
        if self.controller.power_on() == on {
            return;
        }
        if !on {
            self.pause();
        }
        self.controller.set_power_state(on);
        self.play_effect(SoundEffect::Click, Duration::ZERO);
        self.session_dirty = true;
    }

    pub fn set_volume(&mut self, level: f32) {
        self.controller.set_volume(level);
        self.session_dirty = true;
    }

    pub fn set_playback_rate(&mut self, rate: f32) {
        self.controller.set_playback_rate(rate);
        self.session_dirty = true;
    }

    /// Apply one entry of the engine status feed
    pub fn handle_status(&mut self, update: StatusUpdate) -> StatusOutcome {
        let outcome = self.controller.handle_status(update);
        if outcome == StatusOutcome::Finished {
            self.on_track_finished(true);
            self.controller.settle_state();
        }
        outcome
    }

    /// Periodic housekeeping
    ///
    /// Starts due sound effects, fails stuck loads, checkpoints the position
    /// every sync interval while playing, and retries unsaved session state.
    pub fn tick(&mut self, now: Instant) {
        if let Some(effects) = self.effects.as_mut() {
            effects.poll(now);
        }

        self.controller.check_load_timeout(now);

        if self.controller.is_playing() && self.active_cassette_id.is_some() {
            let due = self.last_checkpoint.map_or(true, |last| {
                now.saturating_duration_since(last) >= self.config.sync_interval()
            });
            if due {
                self.checkpoint(now);
            }
        }

        if self.session_dirty {
            self.persist_session();
        }
    }

    // ===== Queue =====

    pub fn add_to_playlist(&mut self, track: Track) {
        self.queue.add_to_playlist(track);
        self.queue_changed();
    }

    pub fn remove_from_playlist(&mut self, track_id: &TrackId) {
        if self.queue.remove_from_playlist(track_id) {
            self.queue_changed();
        }
    }

    pub fn clear_playlist(&mut self) {
        self.queue.clear_playlist();
        self.queue_changed();
    }

    pub fn enqueue_next(&mut self, track: Track) {
        self.queue.enqueue_next(track);
        self.queue_changed();
    }

    pub fn load_playlist(&mut self, tracks: Vec<Track>) {
        self.queue.load_playlist(tracks);
        self.queue_changed();
    }

    pub fn shuffle_playlist(&mut self) {
        self.queue.shuffle_playlist();
        self.queue_changed();
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        self.queue_changed();
        enabled
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat_mode(mode);
        self.queue_changed();
    }

    /// Off -> All -> One -> Off
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.repeat_mode().cycle();
        self.set_repeat_mode(mode);
        mode
    }

    pub fn play_next(&mut self) -> bool {
        let moved = self.queue.play_next(&mut self.controller);
        if moved {
            self.queue_changed();
        }
        moved
    }

    pub fn play_previous(&mut self) -> bool {
        let moved = self.queue.play_previous(&mut self.controller);
        if moved {
            self.queue_changed();
        }
        moved
    }

    pub fn jump_to_track(&mut self, index: usize) -> bool {
        let moved = self.queue.jump_to_track(index, &mut self.controller);
        if moved {
            self.queue_changed();
        }
        moved
    }

    // ===== Cassettes =====

    /// Insert a cassette: queue its tracks and load the first one
    pub fn mount_cassette(&mut self, id: &CassetteId) -> Result<()> {
        let cassette = self
            .memory
            .as_ref()
            .and_then(|m| m.cassette(id))
            .ok_or_else(|| CassetteError::not_found("Cassette", id.as_str()))?;

        self.checkpoint(Instant::now());
        self.controller.pause();

        info!(cassette_id = %cassette.id, tracks = cassette.tracks.len(), "mounting cassette");
        self.queue.load_playlist(cassette.tracks);
        self.set_active(Some(cassette.id));

        if self.queue.is_empty() {
            self.controller.unload();
        } else {
            self.load_current();
        }

        self.play_effect(SoundEffect::Insert, self.config.insert_sfx_delay());
        self.queue_changed();
        Ok(())
    }

    /// Eject the mounted cassette, keeping its bookmark
    pub fn eject(&mut self) {
        if self.active_cassette_id.is_none() && self.controller.current_track().is_none() {
            return;
        }

        self.checkpoint(Instant::now());
        self.controller.pause();
        self.controller.unload();
        self.queue.clear_playlist();
        self.set_active(None);

        self.play_effect(SoundEffect::Eject, Duration::ZERO);
        self.queue_changed();
    }

    // ===== Persistence =====

    /// Record the current position as the active cassette's bookmark
    ///
    /// Skipped while power is off or when no cassette/track is active. While
    /// a track is still loading the deferred seek target is the position;
    /// without one (or after a failed load) the stored bookmark is kept.
    /// Failures are logged; the next checkpoint retries.
    pub fn checkpoint(&mut self, now: Instant) {
        if !self.controller.power_on() {
            return;
        }
        let position = match self.controller.state() {
            PlayerState::ReadyPaused | PlayerState::ReadyPlaying => self.controller.current_time(),
            PlayerState::Loading => match self.controller.pending_seek() {
                Some(target) => target,
                None => return,
            },
            PlayerState::Idle | PlayerState::Errored => return,
        };
        let Some(cassette_id) = self.active_cassette_id.as_ref() else {
            return;
        };
        let Some(track) = self.controller.current_track() else {
            return;
        };
        let Some(memory) = self.memory.as_mut() else {
            return;
        };

        match memory.update_playback_memory(cassette_id, &track.id, position) {
            Ok(()) => {
                debug!(%cassette_id, track_id = %track.id, position, "checkpoint saved");
            }
            Err(e) => {
                warn!(%cassette_id, error = %e, "checkpoint failed");
            }
        }
        self.last_checkpoint = Some(now);
    }

    /// Save queue and settings through the session store
    pub fn persist_session(&mut self) {
        let session = self.persisted_session();
        let Some(sessions) = self.sessions.as_mut() else {
            self.session_dirty = false;
            return;
        };

        match sessions.save_session(&session) {
            Ok(()) => self.session_dirty = false,
            Err(e) => warn!(error = %e, "failed to persist session, will retry"),
        }
    }

    /// Session state as it would be persisted
    pub fn persisted_session(&self) -> PersistedSession {
        let session = self.controller.session();
        PersistedSession {
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
            shuffle_enabled: self.queue.shuffle_enabled(),
            repeat_mode: self.queue.repeat_mode(),
            power_on: session.power_on,
            volume: session.volume,
            rate: session.rate,
            active_cassette_id: self.active_cassette_id.clone(),
        }
    }

    // ===== Presentation =====

    /// Read-only view of the session and queue
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            session: self.controller.session().clone(),
            queue: self.queue.tracks().to_vec(),
            current_index: self.queue.current_index(),
            shuffle_enabled: self.queue.shuffle_enabled(),
            repeat_mode: self.queue.repeat_mode(),
            active_cassette_id: self.active_cassette_id.clone(),
            progress: self.controller.progress(),
            formatted_time: self.controller.formatted_time(),
        }
    }

    /// Take all pending events, in the order they were produced
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.controller.drain_events()
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    pub fn active_cassette_id(&self) -> Option<&CassetteId> {
        self.active_cassette_id.as_ref()
    }

    pub fn effects(&self) -> Option<&SoundEffectPlayer> {
        self.effects.as_ref()
    }

    // ===== Internals =====

    fn on_track_finished(&mut self, resume: bool) {
        if self.queue.repeat_mode() == RepeatMode::One {
            debug!("repeat one, restarting track");
            self.controller.restart_track();
            if resume {
                self.controller.play();
            }
            return;
        }

        let finished_id = self.controller.current_track().map(|t| t.id.clone());
        if !self.queue.play_next(&mut self.controller) {
            debug!("end of queue reached");
            self.checkpoint(Instant::now());
            return;
        }
        self.queue_changed();

        // Single-track wrap or a shuffle repeat lands on the bound track,
        // which load_track treats as a no-op
        let same_track = self.controller.current_track().map(|t| &t.id) == finished_id.as_ref();
        if same_track {
            self.controller.restart_track();
        }
        if resume {
            self.controller.play();
        }
    }

    fn restore_session(&mut self) -> bool {
        let Some(sessions) = self.sessions.as_ref() else {
            return false;
        };
        let session = match sessions.load_session() {
            Ok(Some(session)) => session,
            Ok(None) => return false,
            Err(e) => {
                warn!(error = %e, "failed to load session, starting fresh");
                return false;
            }
        };

        info!(tracks = session.queue.len(), "restoring session");
        self.queue.load_playlist(session.queue);
        self.queue.set_current_index(session.current_index);
        self.queue.set_shuffle(session.shuffle_enabled);
        self.queue.set_repeat_mode(session.repeat_mode);
        self.controller.set_power_state(session.power_on);
        self.controller.set_volume(session.volume);
        self.controller.set_playback_rate(session.rate);

        let active = session
            .active_cassette_id
            .or_else(|| self.memory.as_ref().and_then(|m| m.active_cassette_id()));
        self.set_active(active);
        self.session_dirty = false;
        true
    }

    fn load_current(&mut self) {
        if let Some(track) = self.queue.current().cloned() {
            self.controller.load_track(track);
        }
    }

    fn load_current_from_bookmark(&mut self) {
        let Some(track) = self.queue.current().cloned() else {
            return;
        };

        let position = self
            .active_cassette_id
            .as_ref()
            .and_then(|id| self.memory.as_ref()?.cassette(id))
            .and_then(|cassette| {
                cassette
                    .bookmark()
                    .filter(|&(track_id, _)| *track_id == track.id)
                    .map(|(_, position)| position)
            });

        self.controller.load_track(track);
        if let Some(position) = position {
            self.controller.defer_seek(position);
        }
    }

    fn set_active(&mut self, id: Option<CassetteId>) {
        if self.active_cassette_id == id {
            return;
        }
        if let Some(memory) = self.memory.as_mut() {
            if let Err(e) = memory.set_active_cassette(id.clone()) {
                warn!(error = %e, "failed to persist active cassette");
            }
        }
        self.active_cassette_id = id.clone();
        self.last_checkpoint = None;
        self.controller
            .emit(PlaybackEvent::CassetteChanged { cassette_id: id });
        self.session_dirty = true;
    }

    fn queue_changed(&mut self) {
        self.controller.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
        self.session_dirty = true;
    }

    fn play_effect(&mut self, effect: SoundEffect, delay: Duration) {
        if let Some(effects) = self.effects.as_mut() {
            effects.play(effect, delay, Instant::now());
        }
    }
}
