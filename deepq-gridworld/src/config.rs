//! Configuration of a training run on the grid world.
use crate::{GridWorldConfig, LinearQConfig};
use anyhow::Result;
use deepq_core::{dqn::DqnConfig, replay_buffer::ReplayMemoryConfig, TrainerConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// All settings of a training run, stored in a single YAML file.
///
/// The defaults are the classic DQN constants: discount factor 0.99, replay
/// memory of 1M transitions with learning starting at 50k, epsilon annealed
/// from 1.0 to 0.1 over 1M steps and 0.05 in evaluation, target network
/// refreshed every 10k updates, 50M training steps with an evaluation of
/// 125k steps every 500k steps, and episodes capped at 10k steps.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
pub struct GridWorldDqnConfig {
    /// The map.
    pub env: GridWorldConfig,

    /// The replay memory.
    pub replay_memory: ReplayMemoryConfig,

    /// The learner.
    pub dqn: DqnConfig,

    /// The linear Q-function.
    pub q_function: LinearQConfig,

    /// Budgets of training and evaluation.
    pub trainer: TrainerConfig,
}

impl GridWorldDqnConfig {
    /// Sets the seeds of all random number generators, derived from `seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.replay_memory.seed = seed;
        self.dqn.seed = seed.wrapping_add(1);
        self.q_function.seed = seed.wrapping_add(2);
        self
    }

    /// Sets the number of training steps.
    pub fn total_training_steps(mut self, v: usize) -> Self {
        self.trainer.total_training_steps = v;
        self
    }

    /// Checks all sections.
    pub fn validate(&self) -> Result<()> {
        self.env.validate()?;
        self.replay_memory.validate()?;
        self.dqn.validate(self.replay_memory.capacity)?;
        self.q_function.validate()?;
        self.trainer.validate()?;
        Ok(())
    }

    /// Constructs [`GridWorldDqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GridWorldDqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
