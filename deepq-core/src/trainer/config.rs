//! Configuration of [`Trainer`](super::Trainer).
use crate::error::DeepqError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct TrainerConfig {
    /// The number of environment steps of the whole training.
    pub total_training_steps: usize,

    /// Interval of evaluation in environment steps.
    pub test_interval: usize,

    /// The number of environment steps of an evaluation.
    pub total_test_steps: usize,

    /// Episodes are truncated at this number of steps, both in training and evaluation.
    pub max_episode_steps: usize,

    /// Interval of flushing records in environment steps.
    pub flush_record_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            total_training_steps: 50_000_000,
            test_interval: 500_000,
            total_test_steps: 125_000,
            max_episode_steps: 10_000,
            flush_record_interval: 10_000,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training steps.
    pub fn total_training_steps(mut self, v: usize) -> Self {
        self.total_training_steps = v;
        self
    }

    /// Sets the interval of evaluation in environment steps.
    pub fn test_interval(mut self, v: usize) -> Self {
        self.test_interval = v;
        self
    }

    /// Sets the number of steps of an evaluation.
    pub fn total_test_steps(mut self, v: usize) -> Self {
        self.total_test_steps = v;
        self
    }

    /// Sets the step cap of episodes.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the interval of flushing records in environment steps.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), DeepqError> {
        for (name, v) in [
            ("total_training_steps", self.total_training_steps),
            ("test_interval", self.test_interval),
            ("total_test_steps", self.total_test_steps),
            ("max_episode_steps", self.max_episode_steps),
            ("flush_record_interval", self.flush_record_interval),
        ] {
            if v == 0 {
                return Err(DeepqError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn zero_budgets_are_rejected() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.clone().total_training_steps(0).validate().is_err());
        assert!(config.clone().test_interval(0).validate().is_err());
        assert!(config.clone().total_test_steps(0).validate().is_err());
        assert!(config.clone().max_episode_steps(0).validate().is_err());
        assert!(config.flush_record_interval(0).validate().is_err());
    }

    #[test]
    fn save_and_load_yaml() -> Result<()> {
        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer.yaml");
        let config = TrainerConfig::default()
            .total_training_steps(1000)
            .test_interval(500);
        config.save(&path)?;
        assert_eq!(TrainerConfig::load(&path)?, config);
        Ok(())
    }
}
