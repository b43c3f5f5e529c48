//! DQN agent.
mod base;
mod config;
mod explorer;
mod policy;
pub use base::{Dqn, StepCounters};
pub use config::DqnConfig;
pub use explorer::{epsilon_greedy, greedy, EpsilonGreedy, ExplorationMode};
pub use policy::EvalPolicy;
