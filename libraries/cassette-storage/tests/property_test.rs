//! Property-based tests for the cassette library

use cassette_core::{
    Cassette, CassetteId, NewCassette, PersistenceGateway, PlaybackMemory, Track, TrackId,
};
use cassette_storage::{InMemoryGateway, MemoryStore, LIBRARY_KEY};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;

fn cassette(index: usize, played_offset: Option<u32>) -> Cassette {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut cassette = Cassette::from_new(
        CassetteId::new(format!("c{index}")),
        NewCassette {
            name: format!("Cassette {index}"),
            tracks: vec![Track::new("1", "One", "A", "1.mp3")],
            accent_color: "#FF5722".to_string(),
        },
        base,
    );
    if let Some(offset) = played_offset {
        cassette.last_played_track_id = Some(TrackId::new("1"));
        cassette.last_position = Some(1.0);
        cassette.last_played_at = Some(base + Duration::seconds(i64::from(offset)));
    }
    cassette
}

fn store_with(cassettes: &[Cassette]) -> MemoryStore {
    let gateway = Arc::new(InMemoryGateway::new());
    let doc = serde_json::json!({ "cassettes": cassettes });
    gateway
        .set(LIBRARY_KEY, &serde_json::to_vec(&doc).unwrap())
        .unwrap();
    MemoryStore::open(gateway)
}

proptest! {
    /// Last played is the newest bookmark, else the first cassette
    #[test]
    fn last_played_picks_newest_or_first(
        offsets in prop::collection::vec(prop::option::of(0u32..10_000), 0..12)
    ) {
        let cassettes: Vec<Cassette> = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| cassette(i, *offset))
            .collect();
        let library = store_with(&cassettes);

        let picked = library.last_played_cassette();
        let newest = cassettes.iter().filter_map(|c| c.last_played_at).max();

        match (newest, cassettes.first()) {
            (Some(newest), _) => {
                prop_assert_eq!(picked.and_then(|c| c.last_played_at), Some(newest));
            }
            (None, Some(first)) => {
                prop_assert_eq!(picked.map(|c| c.id), Some(first.id.clone()));
            }
            (None, None) => prop_assert!(picked.is_none()),
        }
    }

    /// Stored positions are always finite and non-negative
    #[test]
    fn stored_positions_are_sane(position in prop::num::f64::ANY) {
        let mut library = store_with(&[cassette(0, None)]);
        let id = CassetteId::new("c0");

        library.update_playback_memory(&id, &TrackId::new("1"), position).unwrap();

        let stored = library.cassette(&id).unwrap().last_position.unwrap();
        prop_assert!(stored.is_finite());
        prop_assert!(stored >= 0.0);
    }
}
