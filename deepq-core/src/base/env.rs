//! Environment.
use super::{ActionSet, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Actions are indices into [`Env::action_set`].
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// The actions available in the environment, fixed for its lifetime.
    fn action_set(&self) -> &ActionSet;

    /// Performs an environment step.
    ///
    /// The returned [`Step`] holds the reward, the next observation and the
    /// termination flag. The environment is not reset automatically.
    fn step(&mut self, act: usize) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way, for example as a random seed
    /// of the episode. [`DefaultEvaluator`](crate::DefaultEvaluator) calls this method
    /// with the number of evaluation episodes run so far.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        let _ = ix;
        self.reset()
    }
}
