//! Playback controller
//!
//! Owns the single decoded resource and is the only caller of the engine's
//! load/play/pause/seek primitives.
//!
//! Loading is asynchronous: `load_track` only submits the source and moves to
//! `Loading`. The engine's status feed later reports `loaded` (or an error)
//! through `handle_status`. Statuses are matched against the bound handle by
//! identity, so anything still arriving for a superseded load is dropped.
//!
//! ```text
//! Idle ──load──▶ Loading ──loaded──▶ ReadyPaused ◀──pause/end──▶ ReadyPlaying
//!                   │
//!                   └──error/timeout──▶ Errored ──load (retry)──▶ Loading
//! ```

use crate::error::SessionError;
use crate::events::PlaybackEvent;
use crate::queue::TrackLoader;
use crate::types::{PlaybackSession, PlayerState};
use cassette_core::types::{MAX_RATE, MIN_RATE};
use cassette_core::{AudioEngine, EngineCapabilities, EngineHandle, EngineStatus, StatusUpdate, Track};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tolerance when deciding that a reported position is the end of the track
const END_TOLERANCE_SECS: f64 = 0.05;

/// Result of feeding one status update to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// Update belonged to a handle that is no longer bound
    Ignored,
    /// Mirror fields updated
    Applied,
    /// Pending load completed
    Loaded,
    /// Track played through to its end; call `settle_state` once the
    /// follow-up (advance, restart or stop) has been applied
    Finished,
    /// Engine reported an error; the session is now `Errored`
    Failed,
}

/// Result of a seek-style command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// Command not accepted (power off, no track, errored)
    Ignored,
    /// Track still loading; the seek runs once the engine reports loaded
    Deferred,
    /// Engine moved to this position (seconds)
    Moved(f64),
    /// Fast-forward landed on the end of the track (see `settle_state`)
    Finished {
        /// Whether the track was playing before the seek
        was_playing: bool,
    },
}

/// Controller for the primary track
pub struct PlaybackController {
    engine: Box<dyn AudioEngine>,
    capabilities: EngineCapabilities,
    handle: Option<EngineHandle>,
    session: PlaybackSession,

    // Intent recorded while a load is in flight
    play_on_load: bool,
    pending_seek: Option<f64>,

    load_started_at: Option<Instant>,
    load_timeout: Option<Duration>,

    /// Last state published as `StateChanged`
    announced_state: PlayerState,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Create a controller around an engine
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        let capabilities = engine.capabilities();
        Self {
            engine,
            capabilities,
            handle: None,
            session: PlaybackSession::default(),
            play_on_load: false,
            pending_seek: None,
            load_started_at: None,
            load_timeout: None,
            announced_state: PlayerState::Idle,
            pending_events: Vec::new(),
        }
    }

    /// Fail loads that have not completed within `timeout`
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    // ===== Track lifecycle =====

    /// Bind a track and start decoding it
    ///
    /// Re-loading the bound track is a no-op unless the previous attempt
    /// failed, in which case this is the retry. Any previously bound handle
    /// is released before the new one is requested.
    pub fn load_track(&mut self, track: Track) {
        if self.is_bound(&track) {
            debug!(track_id = %track.id, "track already bound, skipping reload");
            return;
        }

        let autoplay = self.session.is_playing || self.play_on_load;
        let previous_track_id = self.session.current_track.as_ref().map(|t| t.id.clone());

        self.release_handle();
        self.play_on_load = autoplay;
        self.pending_seek = None;
        self.session.is_playing = false;
        self.session.current_time = 0.0;
        self.session.duration = track.duration_hint.unwrap_or(0.0);
        self.session.last_error = None;

        let track_id = track.id.clone();
        let source = track.audio_source.clone();
        self.session.current_track = Some(track);

        if previous_track_id.as_ref() != Some(&track_id) {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: track_id.clone(),
                previous_track_id,
            });
        }

        match self.engine.load(&source) {
            Ok(handle) => {
                debug!(%track_id, %handle, "loading track");
                self.handle = Some(handle);
                self.load_started_at = Some(Instant::now());
                self.set_state(PlayerState::Loading);
            }
            Err(e) => {
                warn!(%track_id, error = %e, "engine rejected track");
                self.fail(SessionError::Load(e.to_string()));
            }
        }
    }

    /// Release the decoded resource and forget the current track
    pub fn unload(&mut self) {
        self.release_handle();
        self.play_on_load = false;
        self.pending_seek = None;
        self.session.current_track = None;
        self.session.is_playing = false;
        self.session.current_time = 0.0;
        self.session.duration = 0.0;
        self.session.last_error = None;
        self.set_state(PlayerState::Idle);
    }

    /// Apply one entry of the engine status feed
    pub fn handle_status(&mut self, update: StatusUpdate) -> StatusOutcome {
        if self.handle != Some(update.handle) {
            debug!(handle = %update.handle, "ignoring status for stale handle");
            return StatusOutcome::Ignored;
        }

        let status = update.status;
        if let Some(message) = status.error {
            let error = if self.session.state == PlayerState::Loading {
                SessionError::Load(message)
            } else {
                SessionError::Play(message)
            };
            warn!(handle = %update.handle, %error, "engine reported failure");
            self.fail(error);
            return StatusOutcome::Failed;
        }

        if status.duration > 0.0 {
            self.session.duration = status.duration;
        }

        if self.session.state == PlayerState::Loading {
            if !status.loaded {
                return StatusOutcome::Applied;
            }
            self.complete_load(&status);
            return StatusOutcome::Loaded;
        }

        self.session.current_time = status.current_time.max(0.0);

        if self.session.is_playing && !status.playing && self.is_at_end() {
            self.finish_track();
            return StatusOutcome::Finished;
        }

        // With power off the mirror stays paused even if the engine lags
        self.session.is_playing = status.playing && self.session.power_on;
        self.set_state(if self.session.is_playing {
            PlayerState::ReadyPlaying
        } else {
            PlayerState::ReadyPaused
        });
        StatusOutcome::Applied
    }

    /// Fail a load that has been pending longer than the configured timeout
    pub fn check_load_timeout(&mut self, now: Instant) -> bool {
        let (Some(timeout), Some(started)) = (self.load_timeout, self.load_started_at) else {
            return false;
        };
        if self.session.state != PlayerState::Loading
            || now.saturating_duration_since(started) < timeout
        {
            return false;
        }

        warn!(timeout_secs = timeout.as_secs_f64(), "track load timed out");
        self.fail(SessionError::Load(format!(
            "load timed out after {:.1}s",
            timeout.as_secs_f64()
        )));
        true
    }

    // ===== Transport =====

    /// Start or resume playback
    ///
    /// While the track is still loading the request is remembered and
    /// honoured once the engine reports it loaded.
    pub fn play(&mut self) {
        if !self.accepts_commands() {
            return;
        }

        match self.session.state {
            PlayerState::Loading => self.play_on_load = true,
            PlayerState::ReadyPaused => self.start_engine(),
            PlayerState::ReadyPlaying => {}
            PlayerState::Idle | PlayerState::Errored => {
                debug!(state = ?self.session.state, "play ignored");
            }
        }
    }

    /// Pause playback (always safe)
    pub fn pause(&mut self) {
        self.play_on_load = false;

        if self.session.state == PlayerState::ReadyPlaying {
            if let Some(handle) = self.handle {
                if let Err(e) = self.engine.pause(handle) {
                    warn!(%handle, error = %e, "engine pause failed");
                }
            }
            self.set_state(PlayerState::ReadyPaused);
        }
        self.session.is_playing = false;
    }

    /// Toggle between play and pause
    pub fn toggle_play_pause(&mut self) {
        if self.session.is_playing || self.play_on_load {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek to an absolute position, clamped into `[0, duration]`
    pub fn seek_to(&mut self, seconds: f64) -> SeekOutcome {
        if !self.accepts_commands() {
            return SeekOutcome::Ignored;
        }
        self.seek_unchecked(seconds)
    }

    /// Seek backwards by `seconds`
    pub fn rewind(&mut self, seconds: f64) -> SeekOutcome {
        if !self.accepts_commands() {
            return SeekOutcome::Ignored;
        }
        self.seek_unchecked(self.session.current_time - seconds.abs())
    }

    /// Seek forwards by `seconds`
    ///
    /// Landing on the end of the track counts as the track finishing: after
    /// a manual seek the engine may never emit its own end-of-track status.
    pub fn fast_forward(&mut self, seconds: f64) -> SeekOutcome {
        if !self.accepts_commands() {
            return SeekOutcome::Ignored;
        }

        let was_playing = self.session.is_playing;
        let outcome = self.seek_unchecked(self.session.current_time + seconds.abs());
        match outcome {
            SeekOutcome::Moved(_) if self.is_at_end() => {
                if let Some(handle) = self.handle {
                    if let Err(e) = self.engine.pause(handle) {
                        debug!(%handle, error = %e, "pause at end of track failed");
                    }
                }
                self.finish_track();
                SeekOutcome::Finished { was_playing }
            }
            other => other,
        }
    }

    /// Seek to the start without changing whether the track is playing
    pub fn restart_track(&mut self) -> SeekOutcome {
        if !self.accepts_commands() {
            return SeekOutcome::Ignored;
        }
        self.seek_unchecked(0.0)
    }

    /// Remember a seek target for the load in flight
    ///
    /// Used when resuming from a bookmark: seeking before the engine reports
    /// `loaded` is undefined, so the target is applied on load completion.
    pub(crate) fn defer_seek(&mut self, seconds: f64) {
        if self.session.state == PlayerState::Loading && seconds.is_finite() {
            self.pending_seek = Some(seconds.max(0.0));
        }
    }

    // ===== Power, volume, rate =====

    /// Turn the deck on or off
    ///
    /// Turning off pauses the engine and blocks transport commands until the
    /// deck is turned back on. Turning on never resumes playback by itself.
    pub fn set_power_state(&mut self, on: bool) {
        if self.session.power_on == on {
            return;
        }
        if !on {
            self.pause();
        }
        self.session.power_on = on;
        info!(power_on = on, "power state changed");
        self.emit(PlaybackEvent::PowerChanged { on });
    }

    /// Set volume (0.0 - 1.0)
    ///
    /// Stored as intent when the engine has no volume control.
    pub fn set_volume(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }
        self.session.volume = level.clamp(0.0, 1.0);
        let applied = self.apply_volume();
        self.emit(PlaybackEvent::VolumeChanged {
            volume: self.session.volume,
            applied,
        });
    }

    /// Set playback rate (0.5 - 2.0)
    ///
    /// Stored as intent when the engine has no rate control.
    pub fn set_playback_rate(&mut self, rate: f32) {
        if rate.is_nan() {
            return;
        }
        self.session.rate = rate.clamp(MIN_RATE, MAX_RATE);
        let applied = self.apply_rate();
        self.emit(PlaybackEvent::RateChanged {
            rate: self.session.rate,
            applied,
        });
    }

    /// Publish the current state if listeners have not seen it yet
    ///
    /// A finished track is left `ReadyPaused` without a `StateChanged`
    /// event, so that an immediate advance goes straight to `Loading` (or
    /// back to `ReadyPlaying`). Call this after handling a `Finished`
    /// outcome; it is a no-op when the state was already published.
    pub fn settle_state(&mut self) {
        let state = self.session.state;
        if self.announced_state != state {
            self.announced_state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    /// Seek target waiting for the load in flight
    pub fn pending_seek(&self) -> Option<f64> {
        self.pending_seek
    }

    // ===== State Queries =====

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlayerState {
        self.session.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.current_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    pub fn power_on(&self) -> bool {
        self.session.power_on
    }

    pub fn current_time(&self) -> f64 {
        self.session.current_time
    }

    pub fn duration(&self) -> f64 {
        self.session.duration
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.session.last_error.as_ref()
    }

    /// Handle currently bound to the engine
    pub fn handle(&self) -> Option<EngineHandle> {
        self.handle
    }

    pub fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    /// Whether a play request is waiting for the load to complete
    pub fn play_pending(&self) -> bool {
        self.play_on_load
    }

    /// Normalized progress (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        if self.session.duration <= 0.0 {
            return 0.0;
        }
        (self.session.current_time / self.session.duration).clamp(0.0, 1.0)
    }

    /// Current time and duration as "m:ss / m:ss"
    pub fn formatted_time(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.session.current_time),
            format_time(self.session.duration)
        )
    }

    /// Playback rate as "1.0x"
    pub fn rate_display(&self) -> String {
        format!("{:.1}x", self.session.rate)
    }

    /// Whether transport controls should be enabled
    pub fn can_interact(&self) -> bool {
        self.session.power_on && self.session.current_track.is_some()
    }

    // ===== Events =====

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    pub(crate) fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    // ===== Internals =====

    fn is_bound(&self, track: &Track) -> bool {
        self.handle.is_some()
            && self
                .session
                .current_track
                .as_ref()
                .is_some_and(|current| current.id == track.id)
    }

    fn accepts_commands(&self) -> bool {
        if !self.session.power_on {
            debug!("command ignored: power is off");
            return false;
        }
        if self.session.current_track.is_none() {
            debug!("command ignored: no track loaded");
            return false;
        }
        true
    }

    fn is_at_end(&self) -> bool {
        self.session.duration > 0.0
            && self.session.current_time >= self.session.duration - END_TOLERANCE_SECS
    }

    fn set_state(&mut self, state: PlayerState) {
        self.session.state = state;
        self.settle_state();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(%handle, "releasing engine handle");
            self.engine.release(handle);
        }
        self.load_started_at = None;
    }

    fn fail(&mut self, error: SessionError) {
        self.release_handle();
        self.play_on_load = false;
        self.pending_seek = None;
        self.session.is_playing = false;
        self.emit(PlaybackEvent::Error {
            message: error.to_string(),
        });
        self.session.last_error = Some(error);
        self.set_state(PlayerState::Errored);
    }

    fn complete_load(&mut self, status: &EngineStatus) {
        self.load_started_at = None;
        self.session.current_time = status.current_time.max(0.0);
        self.set_state(PlayerState::ReadyPaused);
        debug!(duration = self.session.duration, "track loaded");

        if self.capabilities.volume {
            self.apply_volume();
        }
        if self.capabilities.rate {
            self.apply_rate();
        }

        if let Some(target) = self.pending_seek.take() {
            let landed = self.clamp_position(target);
            self.seek_engine(landed);
        }

        if std::mem::take(&mut self.play_on_load) && self.session.power_on {
            self.start_engine();
        }
    }

    fn start_engine(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        match self.engine.play(handle) {
            Ok(()) => {
                self.session.is_playing = true;
                self.set_state(PlayerState::ReadyPlaying);
            }
            Err(e) => {
                warn!(%handle, error = %e, "engine refused to play");
                let error = SessionError::Play(e.to_string());
                self.emit(PlaybackEvent::Error {
                    message: error.to_string(),
                });
                self.session.last_error = Some(error);
            }
        }
    }

    fn seek_unchecked(&mut self, seconds: f64) -> SeekOutcome {
        if !seconds.is_finite() {
            return SeekOutcome::Ignored;
        }
        match self.session.state {
            PlayerState::Loading => {
                self.pending_seek = Some(seconds.max(0.0));
                SeekOutcome::Deferred
            }
            PlayerState::ReadyPaused | PlayerState::ReadyPlaying => {
                let landed = self.clamp_position(seconds);
                if self.seek_engine(landed) {
                    SeekOutcome::Moved(landed)
                } else {
                    SeekOutcome::Ignored
                }
            }
            PlayerState::Idle | PlayerState::Errored => SeekOutcome::Ignored,
        }
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        if self.session.duration > 0.0 {
            seconds.clamp(0.0, self.session.duration)
        } else {
            seconds.max(0.0)
        }
    }

    fn seek_engine(&mut self, position: f64) -> bool {
        let Some(handle) = self.handle else {
            return false;
        };
        if let Err(e) = self.engine.seek(handle, position) {
            warn!(%handle, position, error = %e, "engine seek failed");
            self.session.last_error = Some(SessionError::Play(e.to_string()));
            return false;
        }
        self.session.current_time = position;
        self.emit(PlaybackEvent::PositionUpdate {
            position,
            duration: self.session.duration,
        });
        true
    }

    fn finish_track(&mut self) {
        self.session.is_playing = false;
        self.session.current_time = self.session.duration;
        // Published by `settle_state` once the caller knows what follows
        self.session.state = PlayerState::ReadyPaused;
        if let Some(track) = &self.session.current_track {
            info!(track_id = %track.id, "track finished");
            let track_id = track.id.clone();
            self.emit(PlaybackEvent::TrackFinished { track_id });
        }
    }

    fn apply_volume(&mut self) -> bool {
        if !self.capabilities.volume || !self.session.state.is_ready() {
            return false;
        }
        let Some(handle) = self.handle else {
            return false;
        };
        match self.engine.set_volume(handle, self.session.volume) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "volume kept as intent");
                false
            }
        }
    }

    fn apply_rate(&mut self) -> bool {
        if !self.capabilities.rate || !self.session.state.is_ready() {
            return false;
        }
        let Some(handle) = self.handle else {
            return false;
        };
        match self.engine.set_rate(handle, self.session.rate) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "rate kept as intent");
                false
            }
        }
    }
}

impl TrackLoader for PlaybackController {
    fn load_track(&mut self, track: Track) {
        PlaybackController::load_track(self, track);
    }
}

/// Format seconds as "m:ss"
pub fn format_time(seconds: f64) -> String {
    if !(seconds > 0.0) {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
