//! Four-rooms grid world and a linear Q-function for `deepq-core`.
//!
//! [`train`] wires the grid world, a [`LinearQ`] on one-hot encoded positions,
//! a replay memory and the learner into a complete training run:
//!
//! ```no_run
//! use deepq_gridworld::{train, GridWorldDqnConfig};
//!
//! let config = GridWorldDqnConfig::default().total_training_steps(100_000);
//! let report = train(&config, None).unwrap();
//! println!("{:?}", report.evaluations.last());
//! ```
mod config;
mod env;
mod linear;
mod vectorizer;
pub use config::GridWorldDqnConfig;
pub use env::{GridState, GridWorld, GridWorldConfig, ACTIONS};
pub use linear::{LinearQ, LinearQConfig};
pub use vectorizer::{OneHotVectorizer, StateVectorizer};

use anyhow::Result;
use deepq_core::{
    dqn::Dqn, record::LogRecorder, replay_buffer::ReplayMemory, Env, ReplayBufferBase,
    StateMonitor, Trainer, TrainingReport,
};
use log::info;

/// The learner on the grid world.
pub type GridWorldDqn = Dqn<GridWorld, LinearQ<OneHotVectorizer>, ReplayMemory<GridState>>;

/// Builds the learner from a configuration.
pub fn build_agent(config: &GridWorldDqnConfig) -> Result<GridWorldDqn> {
    config.validate()?;
    let env = GridWorld::build(&config.env, config.dqn.seed as i64)?;
    let vectorizer = OneHotVectorizer::new(config.env.width, config.env.height);
    let qnet = LinearQ::build(&config.q_function, vectorizer, env.action_set().len())?;
    let buffer = ReplayMemory::build(&config.replay_memory);
    Dqn::build(&config.dqn, env, qnet, buffer)
}

/// Runs training and evaluation as configured.
///
/// If a monitor is given, the learner publishes the current position to it
/// after every step. Records are written through the `log` facade.
pub fn train(
    config: &GridWorldDqnConfig,
    monitor: Option<StateMonitor<GridState>>,
) -> Result<TrainingReport> {
    let mut agent = build_agent(config)?;
    if let Some(monitor) = monitor {
        agent.set_monitor(monitor);
    }
    let mut trainer = Trainer::build(config.trainer.clone())?;
    let eval_seed = config.dqn.seed.wrapping_add(1) as i64;
    let mut evaluator = trainer.default_evaluator::<GridWorld>(&config.env, eval_seed)?;
    let mut recorder = LogRecorder::new();

    info!(
        "Training on a {}x{} grid with {} walls",
        config.env.width,
        config.env.height,
        config.env.walls.len()
    );
    trainer.train(&mut agent, &mut evaluator, &mut recorder)
}
