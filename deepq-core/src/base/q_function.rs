//! Q-function approximator.
use super::Obs;
use crate::record::Record;
use anyhow::Result;

/// A batch of regression targets for [`QFunction::update`].
///
/// The batch is passed by value; the approximator consumes it and must not
/// keep references to it across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct QBatch {
    /// Vectorized observations `x_i`.
    pub inputs: Vec<Vec<f32>>,

    /// Actions `a_i` whose values are regressed.
    pub acts: Vec<usize>,

    /// Targets `y_i` for `Q(x_i, a_i)`.
    pub targets: Vec<f32>,
}

impl QBatch {
    /// The number of samples in the batch.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if the batch has no samples.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// A parametric action-value function with online and target parameters.
///
/// The learner never inspects parameter values; it only evaluates, updates and
/// synchronizes through this interface. Any numeric backend can be plugged in.
pub trait QFunction {
    /// Observation type that the function is defined on.
    type Obs: Obs;

    /// The number of actions, which is the length of the vectors returned by
    /// [`QFunction::evaluate`].
    fn n_actions(&self) -> usize;

    /// Encodes an observation into an input vector.
    ///
    /// Must be deterministic and free of side effects.
    fn vectorize(&self, obs: &Self::Obs) -> Vec<f32>;

    /// Returns action values for the given input, ordered by action index.
    ///
    /// If `use_target` is `true`, the target parameters are used.
    fn evaluate(&self, input: &[f32], use_target: bool) -> Result<Vec<f32>>;

    /// Applies one optimization step to the online parameters.
    ///
    /// Returns some information of the step, e.g., the loss.
    fn update(&mut self, batch: QBatch) -> Result<Record>;

    /// Copies the online parameters into the target parameters.
    fn sync_target(&mut self);
}
