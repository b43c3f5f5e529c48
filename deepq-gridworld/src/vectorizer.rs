//! Encoding of observations into input vectors of a Q-function.
use crate::GridState;
use deepq_core::Obs;

/// Encodes observations into fixed-length input vectors.
pub trait StateVectorizer {
    /// Observation type.
    type Obs: Obs;

    /// Length of the vectors.
    fn input_dim(&self) -> usize;

    /// Encodes an observation. Must be deterministic.
    fn vectorize(&self, obs: &Self::Obs) -> Vec<f32>;
}

/// One-hot encoding of the agent position, `input[y * width + x] = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHotVectorizer {
    width: usize,
    height: usize,
}

impl OneHotVectorizer {
    /// Constructs the vectorizer for a grid of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl StateVectorizer for OneHotVectorizer {
    type Obs = GridState;

    fn input_dim(&self) -> usize {
        self.width * self.height
    }

    fn vectorize(&self, obs: &GridState) -> Vec<f32> {
        assert!(
            obs.x < self.width && obs.y < self.height,
            "Position ({}, {}) is outside of the {}x{} grid",
            obs.x,
            obs.y,
            self.width,
            self.height
        );
        let mut input = vec![0f32; self.input_dim()];
        input[obs.y * self.width + obs.x] = 1.0;
        input
    }
}
