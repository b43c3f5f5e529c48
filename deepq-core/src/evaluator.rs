//! Evaluate a policy.
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Statistics of an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalStats {
    /// Environment steps taken, including steps of a discarded partial episode.
    pub n_steps: usize,

    /// Episodes the statistics are computed over.
    pub n_episodes: usize,

    /// Sum of the returns of the counted episodes.
    pub total_reward: f32,

    /// Sum of the lengths of the counted episodes.
    pub total_episode_steps: usize,
}

impl EvalStats {
    /// Mean return per episode.
    pub fn mean_return(&self) -> f32 {
        if self.n_episodes == 0 {
            0.0
        } else {
            self.total_reward / self.n_episodes as f32
        }
    }

    /// Mean episode length in environment steps.
    pub fn mean_episode_length(&self) -> f32 {
        if self.n_episodes == 0 {
            0.0
        } else {
            self.total_episode_steps as f32 / self.n_episodes as f32
        }
    }

    /// Converts the statistics into a record.
    pub fn to_record(&self) -> Record {
        Record::from_slice(&[
            ("eval_mean_return", RecordValue::Scalar(self.mean_return())),
            (
                "eval_mean_episode_length",
                RecordValue::Scalar(self.mean_episode_length()),
            ),
            ("eval_episodes", RecordValue::Scalar(self.n_episodes as f32)),
            ("eval_steps", RecordValue::Scalar(self.n_steps as f32)),
        ])
    }
}

/// Evaluate a policy.
pub trait Evaluator<E: Env> {
    /// Runs the policy and returns statistics of the run.
    ///
    /// The policy must not learn; the caller decides which policy is evaluated.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<EvalStats>;
}
