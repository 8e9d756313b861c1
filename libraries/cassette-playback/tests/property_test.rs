//! Property-based tests for the deck
//!
//! Uses proptest to verify invariants across many random command sequences.

mod common;

use cassette_core::{EngineHandle, RepeatMode, TrackId};
use cassette_playback::{PlayerState, QueueManager, SoundEffect, SoundEffectPlayer, TrackLoader};
use common::*;
use proptest::prelude::*;
use std::time::{Duration, Instant};

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Command {
    Jump(usize),
    Next,
    Previous,
    Play,
    Pause,
    Seek(f64),
    Loaded(u64),
    Ended(u64),
    Failed(u64),
    Power(bool),
    Repeat(u8),
    Shuffle,
    Eject,
}

fn arbitrary_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0usize..8).prop_map(Command::Jump),
        Just(Command::Next),
        Just(Command::Previous),
        Just(Command::Play),
        Just(Command::Pause),
        (-50.0f64..500.0).prop_map(Command::Seek),
        (1u64..12).prop_map(Command::Loaded),
        (1u64..12).prop_map(Command::Ended),
        (1u64..12).prop_map(Command::Failed),
        any::<bool>().prop_map(Command::Power),
        (0u8..3).prop_map(Command::Repeat),
        Just(Command::Shuffle),
        Just(Command::Eject),
    ]
}

fn apply(h: &mut Harness, command: Command) {
    match command {
        Command::Jump(index) => {
            h.deck.jump_to_track(index);
        }
        Command::Next => {
            h.deck.play_next();
        }
        Command::Previous => {
            h.deck.play_previous();
        }
        Command::Play => h.deck.play(),
        Command::Pause => h.deck.pause(),
        Command::Seek(t) => h.deck.seek_to(t),
        Command::Loaded(raw) => {
            h.deck.handle_status(loaded(EngineHandle::new(raw), 120.0));
        }
        Command::Ended(raw) => {
            h.deck.handle_status(ended(EngineHandle::new(raw), 120.0));
        }
        Command::Failed(raw) => {
            h.deck
                .handle_status(failed(EngineHandle::new(raw), "decode error"));
        }
        Command::Power(on) => h.deck.set_power_state(on),
        Command::Repeat(mode) => h.deck.set_repeat_mode(match mode {
            0 => RepeatMode::Off,
            1 => RepeatMode::All,
            _ => RepeatMode::One,
        }),
        Command::Shuffle => {
            h.deck.toggle_shuffle();
        }
        Command::Eject => h.deck.eject(),
    }
}

struct NullLoader;

impl TrackLoader for NullLoader {
    fn load_track(&mut self, _track: cassette_core::Track) {}
}

// ===== Property Tests =====

proptest! {
    /// Property: the engine never holds more than one decoded resource
    #[test]
    fn at_most_one_live_handle(
        commands in prop::collection::vec(arbitrary_command(), 1..60)
    ) {
        let mut h = Harness::new(vec![]);
        h.deck.load_playlist(tracks(&["a", "b", "c", "d"]));

        for command in commands {
            apply(&mut h, command);
            prop_assert!(h.live_handles() <= 1, "more than one live engine handle");

            let bound = h.deck.controller().handle();
            let engine = h.engine.lock().unwrap();
            if let Some(handle) = bound {
                prop_assert!(engine.live.contains(&handle), "bound handle was released");
            }
        }
    }

    /// Property: position always stays within [0, duration]
    #[test]
    fn position_stays_in_bounds(
        commands in prop::collection::vec(arbitrary_command(), 1..60)
    ) {
        let mut h = Harness::new(vec![]);
        h.deck.load_playlist(tracks(&["a", "b"]));

        for command in commands {
            apply(&mut h, command);
            let controller = h.deck.controller();
            prop_assert!(controller.current_time() >= 0.0);
            if controller.state().is_ready() && controller.duration() > 0.0 {
                prop_assert!(controller.current_time() <= controller.duration());
            }
            prop_assert!((0.0..=1.0).contains(&controller.progress()));
        }
    }

    /// Property: with power off nothing reaches the engine's play primitive
    #[test]
    fn power_off_blocks_play(
        commands in prop::collection::vec(arbitrary_command(), 1..40)
    ) {
        let mut h = Harness::new(vec![]);
        h.deck.load_playlist(tracks(&["a", "b", "c"]));
        h.deck.set_power_state(false);
        let plays_before = h.engine.lock().unwrap().play_count();

        for command in commands {
            if matches!(command, Command::Power(true)) {
                continue;
            }
            apply(&mut h, command);
            prop_assert!(!h.deck.controller().is_playing());
        }
        prop_assert_eq!(h.engine.lock().unwrap().play_count(), plays_before);
    }

    /// Property: queue index is valid after any operation sequence
    #[test]
    fn queue_index_always_valid(
        initial in 1usize..20,
        operations in prop::collection::vec((0u8..8, 0usize..25), 1..50)
    ) {
        let mut queue = QueueManager::with_seed(5);
        queue.load_playlist((0..initial).map(|i| track(&format!("t{i}"))).collect());
        let mut loader = NullLoader;
        let mut next_id = initial;

        for (op, arg) in operations {
            match op {
                0 => { queue.play_next(&mut loader); }
                1 => { queue.play_previous(&mut loader); }
                2 => { queue.jump_to_track(arg, &mut loader); }
                3 => {
                    queue.add_to_playlist(track(&format!("t{next_id}")));
                    next_id += 1;
                }
                4 => {
                    queue.enqueue_next(track(&format!("t{next_id}")));
                    next_id += 1;
                }
                5 => { queue.remove_from_playlist(&TrackId::new(format!("t{arg}"))); }
                6 => { queue.toggle_shuffle(); }
                _ => queue.shuffle_playlist(),
            }

            if queue.is_empty() {
                prop_assert_eq!(queue.current_index(), 0);
            } else {
                prop_assert!(queue.current_index() < queue.len());
            }
        }
    }

    /// Property: next at the end with repeat off never moves
    #[test]
    fn next_at_end_without_repeat_is_noop(len in 1usize..30) {
        let mut queue = QueueManager::with_seed(1);
        queue.load_playlist((0..len).map(|i| track(&format!("t{i}"))).collect());
        queue.set_current_index(len - 1);

        prop_assert!(!queue.play_next(&mut NullLoader));
        prop_assert_eq!(queue.current_index(), len - 1);
    }

    /// Property: previous from the front wraps to the last track in every mode
    #[test]
    fn previous_from_front_wraps(len in 1usize..30, mode in 0u8..3) {
        let mut queue = QueueManager::with_seed(1);
        queue.load_playlist((0..len).map(|i| track(&format!("t{i}"))).collect());
        queue.set_repeat_mode(match mode {
            0 => RepeatMode::Off,
            1 => RepeatMode::All,
            _ => RepeatMode::One,
        });

        prop_assert!(queue.play_previous(&mut NullLoader));
        prop_assert_eq!(queue.current_index(), len - 1);
    }

    /// Property: a key never has more than one instance while it plays
    #[test]
    fn one_effect_instance_per_key(
        requests in prop::collection::vec((0u8..5, 0u64..500), 1..40)
    ) {
        let (backend, state) = MockEffects::new();
        let mut sfx = SoundEffectPlayer::new(Box::new(backend));
        let now = Instant::now();

        for (key, delay_ms) in requests {
            let effect = match key {
                0 => SoundEffect::Insert,
                1 => SoundEffect::Eject,
                2 => SoundEffect::Click,
                3 => SoundEffect::Rewind,
                _ => SoundEffect::FastForward,
            };
            sfx.play(effect, Duration::from_millis(delay_ms), now);
            sfx.poll(now + Duration::from_secs(1));
        }

        let state = state.lock().unwrap();
        let mut created = state.created.clone();
        let total = created.len();
        created.sort();
        created.dedup();
        prop_assert_eq!(total, created.len(), "a key was instantiated twice while playing");
        prop_assert!(sfx.live_count() <= 5);
    }
}

#[test]
fn deck_recovers_to_a_clean_state_after_eject() {
    let mut h = Harness::new(vec![cassette("c1", &["a", "b"])]);
    h.deck.start();
    h.complete_load(100.0);
    h.deck.eject();

    assert_eq!(h.deck.controller().state(), PlayerState::Idle);
    assert_eq!(h.live_handles(), 0);
}
