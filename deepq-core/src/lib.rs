#![warn(missing_docs)]
//! A library for deep Q-learning.
//!
//! The crate provides the control loop of DQN training: a fixed-size replay memory,
//! an annealed epsilon-greedy explorer, a learner with a periodically synchronized
//! target network and a trainer alternating training and evaluation phases under
//! step budgets. Environments and Q-function backends are plugged in through the
//! [`Env`] and [`QFunction`] traits.
pub mod dqn;
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    ActionSet, Env, ExperienceBufferBase, Obs, Policy, QBatch, QFunction, ReplayBufferBase,
    Step,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, EvalStats, Evaluator};

mod monitor;
pub use monitor::{StateMonitor, StatePoller};

mod trainer;
pub use trainer::{Trainer, TrainerConfig, TrainingReport};
