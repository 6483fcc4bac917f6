use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of shuffle keys in `[0, 1)`
pub trait RandomSource {
    fn next_key(&mut self) -> f64;
}

/// Thread-local randomness, the production default
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_key(&mut self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Reproducible randomness from a fixed seed
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_key(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of keys, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    keys: Vec<f64>,
    position: usize,
}

impl SequenceRandom {
    pub fn new(keys: Vec<f64>) -> Self {
        Self { keys, position: 0 }
    }

    /// Keys that make `ShuffleIndex::build` produce exactly `order`
    ///
    /// `order[k]` is the song index that should sit at shuffle position `k`.
    pub fn for_order(order: &[usize]) -> Self {
        let len = order.len().max(1) as f64;
        let mut keys = vec![0.0; order.len()];
        for (position, &song_index) in order.iter().enumerate() {
            if let Some(key) = keys.get_mut(song_index) {
                *key = position as f64 / len;
            }
        }
        Self::new(keys)
    }
}

impl RandomSource for SequenceRandom {
    fn next_key(&mut self) -> f64 {
        if self.keys.is_empty() {
            return 0.0;
        }
        let key = self.keys[self.position % self.keys.len()];
        self.position += 1;
        key
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShuffleEntry {
    pub random_key: f64,
    pub song_index: usize,
}

/// Outcome of moving a duplicate within the shuffle order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Entry came from the back half and was moved toward the front
    PulledForward { from: usize, to: usize },
    /// Entry came from the front half and was moved toward the back
    PushedBack { from: usize, to: usize },
}

impl Relocation {
    /// Whether the traversal cursor must step back one place so that the
    /// next advance lands on the entry that slid into the vacated position
    pub fn cursor_steps_back(&self) -> bool {
        matches!(self, Relocation::PushedBack { .. })
    }

    pub fn target(&self) -> usize {
        match *self {
            Relocation::PulledForward { to, .. } | Relocation::PushedBack { to, .. } => to,
        }
    }
}

/// Playback order over library indices
///
/// Every library index appears exactly once, before and after any number of
/// relocations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShuffleIndex {
    entries: Vec<ShuffleEntry>,
}

impl ShuffleIndex {
    /// Draw one key per library index and order ascending by key
    ///
    /// Equal keys keep library order since the sort is stable.
    pub fn build(library_size: usize, random: &mut dyn RandomSource) -> Self {
        let mut entries: Vec<ShuffleEntry> = (0..library_size)
            .map(|song_index| ShuffleEntry {
                random_key: random.next_key(),
                song_index,
            })
            .collect();
        entries.sort_by(|a, b| a.random_key.total_cmp(&b.random_key));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ShuffleEntry] {
        &self.entries
    }

    /// Song indices in playback order
    pub fn order(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.song_index).collect()
    }

    /// Distance a duplicate is moved: `floor(len * 3 / 7)`
    pub fn relocation_offset(list_length: usize) -> usize {
        list_length * 3 / 7
    }

    /// Move the entry at `position` away from the cursor
    ///
    /// Entries in the back half (`position > len / 2`) are pulled toward the
    /// front, the rest are pushed toward the back. Targets are clamped into
    /// the list. Returns `None` when `position` is out of range.
    pub fn relocate(&mut self, position: usize) -> Option<Relocation> {
        let list_length = self.entries.len();
        if position >= list_length {
            return None;
        }

        let offset = Self::relocation_offset(list_length);
        let entry = self.entries.remove(position);

        let relocation = if position * 2 > list_length {
            Relocation::PulledForward {
                from: position,
                to: position.saturating_sub(offset),
            }
        } else {
            Relocation::PushedBack {
                from: position,
                to: (position + offset).min(list_length - 1),
            }
        };

        self.entries.insert(relocation.target(), entry);
        Some(relocation)
    }

    /// Check that the index holds each of `0..len` exactly once
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.entries.len()];
        for entry in &self.entries {
            match seen.get_mut(entry.song_index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_build_sorts_by_key() {
        let mut random = SequenceRandom::new(vec![0.7, 0.1, 0.4]);
        let index = ShuffleIndex::build(3, &mut random);

        assert_eq!(index.order(), vec![1, 2, 0]);
        assert!(index.is_permutation());
        assert!(index.entries().windows(2).all(|w| w[0].random_key <= w[1].random_key));
    }

    #[test]
    fn test_build_ties_keep_library_order() {
        let mut random = SequenceRandom::new(vec![0.5, 0.2, 0.5, 0.5]);
        let index = ShuffleIndex::build(4, &mut random);

        assert_eq!(index.order(), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_for_order_reproduces_order() {
        let mut random = SequenceRandom::for_order(&[3, 0, 2, 1]);
        let index = ShuffleIndex::build(4, &mut random);

        assert_eq!(index.order(), vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_build_empty() {
        let index = ShuffleIndex::build(0, &mut ThreadRandom);
        assert!(index.is_empty());
        assert!(index.is_permutation());
    }

    #[test]
    fn test_relocate_pushes_front_half_back() {
        // 10 entries: offset is floor(30 / 7) = 4
        let mut random = SequenceRandom::for_order(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut index = ShuffleIndex::build(10, &mut random);

        let relocation = index.relocate(2).unwrap();

        assert_eq!(relocation, Relocation::PushedBack { from: 2, to: 6 });
        assert!(relocation.cursor_steps_back());
        assert_eq!(index.order(), vec![0, 1, 3, 4, 5, 6, 2, 7, 8, 9]);
    }

    #[test]
    fn test_relocate_midpoint_counts_as_front_half() {
        let mut random = SequenceRandom::for_order(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut index = ShuffleIndex::build(10, &mut random);

        let relocation = index.relocate(5).unwrap();

        assert_eq!(relocation, Relocation::PushedBack { from: 5, to: 9 });
    }

    #[test]
    fn test_relocate_pulls_back_half_forward() {
        let mut random = SequenceRandom::for_order(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let mut index = ShuffleIndex::build(10, &mut random);

        let relocation = index.relocate(8).unwrap();

        assert_eq!(relocation, Relocation::PulledForward { from: 8, to: 4 });
        assert!(!relocation.cursor_steps_back());
        assert_eq!(index.order(), vec![0, 1, 2, 3, 8, 4, 5, 6, 7, 9]);
    }

    #[test]
    fn test_relocate_short_lists_land_on_last_position() {
        let mut random = SequenceRandom::for_order(&[0, 1, 2, 3, 4, 5, 6]);
        let mut index = ShuffleIndex::build(7, &mut random);
        let mut short = ShuffleIndex::build(3, &mut SequenceRandom::for_order(&[0, 1, 2]));
        assert_eq!(short.relocate(1), Some(Relocation::PushedBack { from: 1, to: 2 }));
        assert_eq!(short.order(), vec![0, 2, 1]);

        assert_eq!(index.relocate(3), Some(Relocation::PushedBack { from: 3, to: 6 }));
        assert_eq!(index.order(), vec![0, 1, 2, 4, 5, 6, 3]);
    }

    #[test]
    fn test_relocate_out_of_range() {
        let mut index = ShuffleIndex::build(2, &mut ThreadRandom);
        assert_eq!(index.relocate(2), None);
        assert!(index.is_permutation());
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = ShuffleIndex::build(50, &mut SeededRandom::new(42));
        let b = ShuffleIndex::build(50, &mut SeededRandom::new(42));
        assert_eq!(a.order(), b.order());
        assert!(a.entries().iter().all(|e| (0.0..1.0).contains(&e.random_key)));
    }

    proptest! {
        #[test]
        fn relocations_preserve_permutation(
            size in 1usize..60,
            seed in any::<u64>(),
            moves in proptest::collection::vec(any::<usize>(), 0..40),
        ) {
            let mut index = ShuffleIndex::build(size, &mut SeededRandom::new(seed));
            for position in moves {
                index.relocate(position % size);
                prop_assert!(index.is_permutation());
                prop_assert_eq!(index.len(), size);
            }
        }
    }
}
