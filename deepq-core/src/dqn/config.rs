//! Configuration of DQN agent.
use super::explorer::EpsilonGreedy;
use crate::error::DeepqError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig {
    /// Discount factor `gamma` of the Bellman target, in `(0, 1]`.
    pub discount_factor: f64,

    /// The number of transitions in a batch of an optimization step.
    pub batch_size: usize,

    /// Optimization starts once the replay memory holds this many transitions.
    pub replay_start_size: usize,

    /// The number of optimization steps between target network synchronizations.
    pub stale_update_freq: usize,

    /// Exploration in training and evaluation.
    pub explorer: EpsilonGreedy,

    /// Random seed for action selection.
    pub seed: u64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            discount_factor: 0.99,
            batch_size: 32,
            replay_start_size: 50_000,
            stale_update_freq: 10_000,
            explorer: EpsilonGreedy::default(),
            seed: 42,
        }
    }
}

impl DqnConfig {
    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Minimum number of transitions in the replay memory before optimization.
    pub fn replay_start_size(mut self, v: usize) -> Self {
        self.replay_start_size = v;
        self
    }

    /// Interval of target network synchronization in optimization steps.
    pub fn stale_update_freq(mut self, v: usize) -> Self {
        self.stale_update_freq = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the configuration against itself and the capacity of the replay memory.
    pub fn validate(&self, replay_capacity: usize) -> Result<(), DeepqError> {
        if !(self.discount_factor > 0.0 && self.discount_factor <= 1.0) {
            return Err(DeepqError::InvalidConfig(format!(
                "discount_factor must be in (0, 1], got {}",
                self.discount_factor
            )));
        }
        if self.batch_size == 0 {
            return Err(DeepqError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.replay_start_size < self.batch_size {
            return Err(DeepqError::InvalidConfig(format!(
                "replay_start_size ({}) is smaller than batch_size ({})",
                self.replay_start_size, self.batch_size
            )));
        }
        if self.replay_start_size > replay_capacity {
            return Err(DeepqError::InvalidConfig(format!(
                "replay_start_size ({}) exceeds the capacity of the replay memory ({})",
                self.replay_start_size, replay_capacity
            )));
        }
        if self.stale_update_freq == 0 {
            return Err(DeepqError::InvalidConfig(
                "stale_update_freq must be positive".to_string(),
            ));
        }
        self.explorer.validate()
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
