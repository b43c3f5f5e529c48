//! Ring buffer of transitions.
use super::{ReplayMemoryConfig, Transition, TransitionBatch};
use crate::{ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A fixed-capacity replay memory.
///
/// Transitions are written at a cursor that wraps around, so once the memory is
/// full every push overwrites the oldest transition. The number of valid
/// transitions is always `min(n_pushed, capacity)`.
///
/// Batches are drawn uniformly at random with replacement from the valid slots.
pub struct ReplayMemory<O> {
    capacity: usize,
    i: usize,
    size: usize,
    n_pushed: usize,
    buf: Vec<Transition<O>>,
    rng: StdRng,
}

impl<O: Clone> ReplayMemory<O> {
    /// Builds a replay memory with the given capacity and seed.
    pub fn new(capacity: usize, seed: u64) -> Self {
        assert!(capacity > 0, "Capacity of a replay memory must be positive");
        Self {
            capacity,
            i: 0,
            size: 0,
            n_pushed: 0,
            buf: Vec::with_capacity(capacity),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The total number of pushed transitions, including overwritten ones.
    pub fn n_pushed(&self) -> usize {
        self.n_pushed
    }

    /// Returns the transition at slot `ix`, if the slot holds a valid transition.
    pub fn get(&self, ix: usize) -> Option<&Transition<O>> {
        if ix < self.size {
            self.buf.get(ix)
        } else {
            None
        }
    }

    /// Iterates over the valid transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O>> {
        let (newer, older) = if self.size < self.capacity {
            (&self.buf[..], &self.buf[..0])
        } else {
            self.buf.split_at(self.i)
        };
        older.iter().chain(newer.iter())
    }

    /// Draws `n` slot indices uniformly at random with replacement from `[0, len)`.
    ///
    /// Panics if the memory is empty.
    pub fn sample_indices(&mut self, n: usize) -> Vec<usize> {
        assert!(
            self.size > 0,
            "Sampling from an empty replay memory. Check the warmup period."
        );
        let size = self.size;
        (0..n).map(|_| self.rng.gen_range(0..size)).collect()
    }
}

impl<O: Clone> ExperienceBufferBase for ReplayMemory<O> {
    type Item = Transition<O>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.buf.len() < self.capacity {
            self.buf.push(tr);
        } else {
            self.buf[self.i] = tr;
        }

        self.i = (self.i + 1) % self.capacity;
        self.size = (self.size + 1).min(self.capacity);
        self.n_pushed += 1;

        Ok(())
    }

    fn len(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<O: Clone> ReplayBufferBase for ReplayMemory<O> {
    type Config = ReplayMemoryConfig;
    type Batch = TransitionBatch<O>;

    fn build(config: &Self::Config) -> Self {
        Self::new(config.capacity, config.seed)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let ixs = self.sample_indices(size);
        let mut batch = TransitionBatch::with_capacity(size);
        for ix in ixs {
            batch.push(ix, &self.buf[ix]);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(k: usize) -> Transition<usize> {
        Transition {
            obs: k,
            act: k % 2,
            reward: k as f32,
            next_obs: k + 1,
            is_terminated: false,
        }
    }

    fn memory(capacity: usize) -> ReplayMemory<usize> {
        ReplayMemory::build(&ReplayMemoryConfig::default().capacity(capacity).seed(7))
    }

    #[test]
    fn len_is_min_of_pushes_and_capacity() {
        let mut m = memory(4);
        assert!(m.is_empty());
        for k in 0..10 {
            m.push(tr(k)).unwrap();
            assert_eq!(m.len(), (k + 1).min(4));
            assert_eq!(m.n_pushed(), k + 1);
        }
        assert_eq!(m.capacity(), 4);
    }

    #[test]
    fn oldest_transitions_are_overwritten() {
        let mut m = memory(3);
        for k in 0..5 {
            m.push(tr(k)).unwrap();
        }
        // slots: [3, 4, 2], oldest first: 2, 3, 4
        let kept: Vec<usize> = m.iter().map(|t| t.obs).collect();
        assert_eq!(kept, vec![2, 3, 4]);
        assert_eq!(m.get(0).map(|t| t.obs), Some(3));
        assert!(m.get(3).is_none());
    }

    #[test]
    fn iter_before_wrapping_is_insertion_order() {
        let mut m = memory(5);
        for k in 0..3 {
            m.push(tr(k)).unwrap();
        }
        let kept: Vec<usize> = m.iter().map(|t| t.obs).collect();
        assert_eq!(kept, vec![0, 1, 2]);
        assert!(m.get(3).is_none());
    }

    #[test]
    fn batch_only_draws_valid_slots() {
        let mut m = memory(100);
        for k in 0..7 {
            m.push(tr(k)).unwrap();
        }
        for _ in 0..200 {
            let batch = m.batch(16).unwrap();
            assert_eq!(batch.len(), 16);
            assert!(batch.ix_sample.iter().all(|&ix| ix < 7));
            for (ix, (obs, act, reward, next_obs, _)) in batch.ix_sample.iter().zip(batch.iter()) {
                assert_eq!(*obs, *ix);
                assert_eq!(act, ix % 2);
                assert_eq!(reward, *ix as f32);
                assert_eq!(*next_obs, ix + 1);
            }
        }
    }

    #[test]
    fn sampling_is_uniform_over_valid_slots() {
        let mut m = memory(10);
        for k in 0..10 {
            m.push(tr(k)).unwrap();
        }
        let n = 100_000;
        let mut counts = [0usize; 10];
        for ix in m.sample_indices(n) {
            counts[ix] += 1;
        }
        let expected = n as f64 / 10.0;
        for c in counts {
            assert!(
                ((c as f64) - expected).abs() < 0.05 * expected,
                "counts deviate from uniform: {:?}",
                counts
            );
        }
    }

    #[test]
    fn sampling_is_with_replacement() {
        let mut m = memory(10);
        m.push(tr(0)).unwrap();
        let batch = m.batch(5).unwrap();
        assert_eq!(batch.ix_sample, vec![0; 5]);
    }

    #[test]
    #[should_panic(expected = "empty replay memory")]
    fn sampling_an_empty_memory_panics() {
        let mut m = memory(10);
        let _ = m.batch(1);
    }
}
