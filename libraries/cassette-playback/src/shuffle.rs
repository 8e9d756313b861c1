//! Shuffle helpers for queue randomization
//!
//! Both helpers take the generator explicitly so the queue can run on a
//! seeded `StdRng` in tests and on entropy otherwise.

use rand::seq::SliceRandom;
use rand::Rng;

/// Fisher-Yates shuffle in place
///
/// Each permutation is equally likely.
pub fn shuffle_in_place<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Uniformly random index into a collection of `len` items
///
/// Repeats of the current index are allowed. Returns `None` when empty.
pub fn random_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn shuffle_preserves_all_items() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..10).collect();

        shuffle_in_place(&mut items, &mut rng);

        let unique: HashSet<u32> = items.iter().copied().collect();
        assert_eq!(unique.len(), 10);
        assert_eq!(items.len(), 10);
    }

    #[test]
    fn shuffle_changes_order_of_large_collection() {
        let mut rng = StdRng::seed_from_u64(42);
        let original: Vec<u32> = (0..50).collect();
        let mut items = original.clone();

        shuffle_in_place(&mut items, &mut rng);

        // 1 / 50! chance of a false failure
        assert_ne!(items, original);
    }

    #[test]
    fn random_index_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let index = random_index(3, &mut rng).unwrap();
            assert!(index < 3);
        }
    }

    #[test]
    fn random_index_of_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_index(0, &mut rng), None);
    }

    #[test]
    fn random_index_eventually_covers_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let seen: HashSet<usize> = (0..100)
            .filter_map(|_| random_index(4, &mut rng))
            .collect();
        assert_eq!(seen.len(), 4);
    }
}
