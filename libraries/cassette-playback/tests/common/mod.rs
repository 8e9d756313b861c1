//! Shared test infrastructure: scripted engine, effect backend, and
//! in-memory storage collaborators.

#![allow(dead_code)]

use cassette_core::{
    AudioEngine, Cassette, CassetteError, CassetteId, EffectBackend, EffectId, EffectStatus,
    EngineCapabilities, EngineHandle, EngineStatus, NewCassette, PersistedSession, PlaybackMemory,
    Result, SessionStore, StatusUpdate, Track, TrackId,
};
use cassette_playback::{Deck, DeckConfig, SoundEffectPlayer};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Release(EngineHandle),
    Play(EngineHandle),
    Pause(EngineHandle),
    Seek(EngineHandle, f64),
    Volume(EngineHandle, f32),
    Rate(EngineHandle, f32),
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub next_handle: u64,
    pub live: HashSet<EngineHandle>,
    pub calls: Vec<EngineCall>,
    pub reject_sources: HashSet<String>,
    pub reject_play: bool,
}

impl EngineState {
    pub fn last_handle(&self) -> EngineHandle {
        EngineHandle::new(self.next_handle)
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Seek(_, pos) => Some(*pos),
                _ => None,
            })
            .collect()
    }

    pub fn play_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Play(_)))
            .count()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Load(source) => Some(source.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Engine that records calls; status is delivered by the test
pub struct MockEngine {
    state: Arc<Mutex<EngineState>>,
    capabilities: EngineCapabilities,
}

impl MockEngine {
    pub fn new() -> (Self, Arc<Mutex<EngineState>>) {
        let state = Arc::new(Mutex::new(EngineState::default()));
        (
            Self {
                state: state.clone(),
                capabilities: EngineCapabilities::default(),
            },
            state,
        )
    }

    pub fn with_capabilities(mut self, capabilities: EngineCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl AudioEngine for MockEngine {
    fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    fn load(&mut self, source: &str) -> Result<EngineHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Load(source.to_string()));
        if state.reject_sources.contains(source) {
            return Err(CassetteError::load(format!("cannot decode {source}")));
        }
        state.next_handle += 1;
        let handle = EngineHandle::new(state.next_handle);
        state.live.insert(handle);
        Ok(handle)
    }

    fn release(&mut self, handle: EngineHandle) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Release(handle));
        state.live.remove(&handle);
    }

    fn play(&mut self, handle: EngineHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.reject_play {
            return Err(CassetteError::play("autoplay blocked"));
        }
        state.calls.push(EngineCall::Play(handle));
        Ok(())
    }

    fn pause(&mut self, handle: EngineHandle) -> Result<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Pause(handle));
        Ok(())
    }

    fn seek(&mut self, handle: EngineHandle, seconds: f64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(EngineCall::Seek(handle, seconds));
        Ok(())
    }

    fn set_volume(&mut self, handle: EngineHandle, volume: f32) -> Result<()> {
        if !self.capabilities.volume {
            return Err(CassetteError::Unsupported("volume"));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(EngineCall::Volume(handle, volume));
        Ok(())
    }

    fn set_rate(&mut self, handle: EngineHandle, rate: f32) -> Result<()> {
        if !self.capabilities.rate {
            return Err(CassetteError::Unsupported("rate"));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(EngineCall::Rate(handle, rate));
        Ok(())
    }
}

pub fn loaded(handle: EngineHandle, duration: f64) -> StatusUpdate {
    StatusUpdate::new(
        handle,
        EngineStatus {
            loaded: true,
            duration,
            ..Default::default()
        },
    )
}

pub fn playing_at(handle: EngineHandle, current_time: f64, duration: f64) -> StatusUpdate {
    StatusUpdate::new(
        handle,
        EngineStatus {
            loaded: true,
            playing: true,
            current_time,
            duration,
            error: None,
        },
    )
}

pub fn ended(handle: EngineHandle, duration: f64) -> StatusUpdate {
    StatusUpdate::new(
        handle,
        EngineStatus {
            loaded: true,
            playing: false,
            current_time: duration,
            duration,
            error: None,
        },
    )
}

pub fn failed(handle: EngineHandle, message: &str) -> StatusUpdate {
    StatusUpdate::new(
        handle,
        EngineStatus {
            error: Some(message.to_string()),
            ..Default::default()
        },
    )
}

// ============================================================================
// Sound effects
// ============================================================================

#[derive(Debug, Default)]
pub struct EffectsState {
    pub next_id: u64,
    pub created: Vec<String>,
    pub playing: HashMap<EffectId, bool>,
    pub released: Vec<EffectId>,
}

impl EffectsState {
    pub fn finish_all(&mut self) {
        for playing in self.playing.values_mut() {
            *playing = false;
        }
    }
}

pub struct MockEffects(pub Arc<Mutex<EffectsState>>);

impl MockEffects {
    pub fn new() -> (Self, Arc<Mutex<EffectsState>>) {
        let state = Arc::new(Mutex::new(EffectsState::default()));
        (Self(state.clone()), state)
    }
}

impl EffectBackend for MockEffects {
    fn create(&mut self, clip: &str) -> Result<EffectId> {
        let mut state = self.0.lock().unwrap();
        state.next_id += 1;
        state.created.push(clip.to_string());
        Ok(EffectId(state.next_id))
    }

    fn play(&mut self, id: EffectId) -> Result<()> {
        self.0.lock().unwrap().playing.insert(id, true);
        Ok(())
    }

    fn status(&self, id: EffectId) -> EffectStatus {
        let state = self.0.lock().unwrap();
        match state.playing.get(&id) {
            Some(playing) => EffectStatus {
                loaded: true,
                playing: *playing,
            },
            None => EffectStatus::default(),
        }
    }

    fn release(&mut self, id: EffectId) {
        let mut state = self.0.lock().unwrap();
        state.playing.remove(&id);
        state.released.push(id);
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Default)]
pub struct LibraryState {
    pub cassettes: Vec<Cassette>,
    pub active: Option<CassetteId>,
    pub checkpoints: Vec<(CassetteId, TrackId, f64)>,
}

/// Vec-backed playback memory
pub struct SharedMemory(pub Arc<Mutex<LibraryState>>);

impl SharedMemory {
    pub fn new(cassettes: Vec<Cassette>) -> (Self, Arc<Mutex<LibraryState>>) {
        let state = Arc::new(Mutex::new(LibraryState {
            cassettes,
            ..Default::default()
        }));
        (Self(state.clone()), state)
    }
}

impl PlaybackMemory for SharedMemory {
    fn update_playback_memory(
        &mut self,
        cassette_id: &CassetteId,
        track_id: &TrackId,
        position: f64,
    ) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        state
            .checkpoints
            .push((cassette_id.clone(), track_id.clone(), position));
        let cassette = state
            .cassettes
            .iter_mut()
            .find(|c| &c.id == cassette_id)
            .ok_or_else(|| CassetteError::not_found("Cassette", cassette_id.as_str()))?;
        cassette.last_played_track_id = Some(track_id.clone());
        cassette.last_position = Some(position);
        cassette.last_played_at = Some(Utc::now());
        Ok(())
    }

    fn last_played_cassette(&self) -> Option<Cassette> {
        let state = self.0.lock().unwrap();
        state
            .cassettes
            .iter()
            .filter(|c| c.last_played_at.is_some())
            .max_by_key(|c| c.last_played_at)
            .or_else(|| state.cassettes.first())
            .cloned()
    }

    fn active_cassette_id(&self) -> Option<CassetteId> {
        self.0.lock().unwrap().active.clone()
    }

    fn set_active_cassette(&mut self, id: Option<CassetteId>) -> Result<()> {
        self.0.lock().unwrap().active = id;
        Ok(())
    }

    fn cassette(&self, id: &CassetteId) -> Option<Cassette> {
        let state = self.0.lock().unwrap();
        state.cassettes.iter().find(|c| &c.id == id).cloned()
    }
}

/// Session store kept in a shared slot
pub struct SharedSessions(pub Arc<Mutex<Option<PersistedSession>>>);

impl SessionStore for SharedSessions {
    fn load_session(&self) -> Result<Option<PersistedSession>> {
        Ok(self.0.lock().unwrap().clone())
    }

    fn save_session(&mut self, session: &PersistedSession) -> Result<()> {
        *self.0.lock().unwrap() = Some(session.clone());
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Track {id}"), "Test Artist", format!("{id}.mp3"))
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn cassette(id: &str, track_ids: &[&str]) -> Cassette {
    Cassette::from_new(
        CassetteId::new(id),
        NewCassette {
            name: format!("Cassette {id}"),
            tracks: tracks(track_ids),
            accent_color: "#7E57FF".to_string(),
        },
        Utc::now() - ChronoDuration::days(1),
    )
}

pub fn test_config() -> DeckConfig {
    DeckConfig {
        shuffle_seed: Some(7),
        ..Default::default()
    }
}

pub struct Harness {
    pub deck: Deck,
    pub engine: Arc<Mutex<EngineState>>,
    pub effects: Arc<Mutex<EffectsState>>,
    pub library: Arc<Mutex<LibraryState>>,
    pub sessions: Arc<Mutex<Option<PersistedSession>>>,
}

impl Harness {
    pub fn new(cassettes: Vec<Cassette>) -> Self {
        Self::with_config(cassettes, test_config())
    }

    pub fn with_config(cassettes: Vec<Cassette>, config: DeckConfig) -> Self {
        let (engine, engine_state) = MockEngine::new();
        let (effects, effects_state) = MockEffects::new();
        let (memory, library) = SharedMemory::new(cassettes);
        let sessions = Arc::new(Mutex::new(None));

        let deck = Deck::new(Box::new(engine), config)
            .with_memory(Box::new(memory))
            .with_effects(SoundEffectPlayer::new(Box::new(effects)))
            .with_session_store(Box::new(SharedSessions(sessions.clone())));

        Self {
            deck,
            engine: engine_state,
            effects: effects_state,
            library,
            sessions,
        }
    }

    /// Current engine handle bound by the deck
    pub fn handle(&self) -> EngineHandle {
        self.deck
            .controller()
            .handle()
            .expect("deck should have a bound handle")
    }

    /// Report the bound handle loaded
    pub fn complete_load(&mut self, duration: f64) {
        let handle = self.handle();
        self.deck.handle_status(loaded(handle, duration));
    }

    pub fn current_id(&self) -> Option<String> {
        self.deck
            .controller()
            .current_track()
            .map(|t| t.id.as_str().to_string())
    }

    pub fn live_handles(&self) -> usize {
        self.engine.lock().unwrap().live.len()
    }
}
