//! Train [`Dqn`] agent.
mod config;
use crate::{
    dqn::{Dqn, StepCounters},
    record::{AggregateRecorder, RecordValue},
    replay_buffer::{Transition, TransitionBatch},
    DefaultEvaluator, Env, EvalStats, Evaluator, ExperienceBufferBase, QFunction,
    ReplayBufferBase,
};
use anyhow::Result;
use chrono::Local;
pub use config::TrainerConfig;
use log::info;
use std::time::{Duration, Instant};

/// Summary of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Step counters of the learner at the end of training.
    pub counters: StepCounters,

    /// Evaluation results with the environment step at which each evaluation ran.
    pub evaluations: Vec<(usize, EvalStats)>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages training loop and related objects.
///
/// # Training loop
///
/// 0. Given a [`Dqn`] learner, an [`Evaluator`] and an [`AggregateRecorder`].
/// 1. Run a training window: call [`Dqn::train_step`] until `test_interval`
///    more environment steps are taken or `total_training_steps` is reached.
///    Records of the steps are stored in the recorder and flushed every
///    `flush_record_interval` environment steps together with
///    `env_steps_per_sec`, the wall-clock throughput since the last flush.
/// 2. Evaluate the policy given by [`Dqn::eval_policy`] and store the result
///    as `eval_mean_return`, `eval_mean_episode_length`, `eval_episodes`.
/// 3. Back to 1 while the environment steps are less than `total_training_steps`.
///
/// With `total_training_steps = 1000` and `test_interval = 500`, evaluation
/// runs at steps 500 and 1000. The budget is the only stopping rule.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     T[Trainer]-->|train_step|A[Dqn]
///     A-->|act|B[Env]
///     B-->|Step|A
///     A-->|Transition|C[ReplayMemory]
///     C-->|TransitionBatch|A
///     A-->|QBatch|Q[QFunction]
///     T-->|EvalPolicy|D[Evaluator]
/// ```
pub struct Trainer {
    total_training_steps: usize,
    test_interval: usize,
    total_test_steps: usize,
    max_episode_steps: usize,
    flush_record_interval: usize,

    /// Environment steps for computing environment steps per second.
    env_steps_for_sps: usize,

    /// Timer for computing environment steps per second.
    timer_for_sps: Duration,
}

impl Trainer {
    /// Constructs a trainer.
    ///
    /// Fails if the configuration is invalid.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            total_training_steps: config.total_training_steps,
            test_interval: config.test_interval,
            total_test_steps: config.total_test_steps,
            max_episode_steps: config.max_episode_steps,
            flush_record_interval: config.flush_record_interval,
            env_steps_for_sps: 0,
            timer_for_sps: Duration::new(0, 0),
        })
    }

    /// Builds a [`DefaultEvaluator`] running `total_test_steps` steps with the
    /// same episode step cap as training.
    pub fn default_evaluator<E: Env>(
        &self,
        env_config: &E::Config,
        seed: i64,
    ) -> Result<DefaultEvaluator<E>> {
        DefaultEvaluator::new(env_config, seed, self.total_test_steps, self.max_episode_steps)
    }

    /// Returns environment steps per second, then reset the internal counter.
    fn env_steps_per_sec(&mut self) -> f32 {
        let secs = self.timer_for_sps.as_secs_f32();
        let sps = if secs > 0.0 {
            self.env_steps_for_sps as f32 / secs
        } else {
            0.0
        };
        self.env_steps_for_sps = 0;
        self.timer_for_sps = Duration::new(0, 0);
        sps
    }

    /// Train the agent.
    pub fn train<E, Q, R, D>(
        &mut self,
        agent: &mut Dqn<E, Q, R>,
        evaluator: &mut D,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<TrainingReport>
    where
        E: Env,
        Q: QFunction<Obs = E::Obs>,
        R: ExperienceBufferBase<Item = Transition<E::Obs>>
            + ReplayBufferBase<Batch = TransitionBatch<E::Obs>>,
        D: Evaluator<E>,
    {
        let mut evaluations = vec![];
        info!(
            "Starts training for {} steps, evaluation every {} steps",
            self.total_training_steps, self.test_interval
        );

        while agent.counters().env_steps < self.total_training_steps {
            let window_end =
                (agent.counters().env_steps + self.test_interval).min(self.total_training_steps);

            while agent.counters().env_steps < window_end {
                let timer = Instant::now();
                let mut record = agent.train_step(self.max_episode_steps)?;
                self.timer_for_sps += timer.elapsed();
                self.env_steps_for_sps += 1;

                let counters = agent.counters();
                if counters.env_steps % self.flush_record_interval == 0 {
                    record.insert("env_steps_per_sec", RecordValue::Scalar(self.env_steps_per_sec()));
                    record.insert("opt_steps", RecordValue::Scalar(counters.opt_steps as f32));
                    record.insert("target_syncs", RecordValue::Scalar(counters.target_syncs as f32));
                    recorder.store(record);
                    recorder.flush(counters.env_steps as i64);
                } else {
                    recorder.store(record);
                }
            }

            // Evaluation
            let env_steps = agent.counters().env_steps;
            info!("Starts evaluation at step {}", env_steps);
            let stats = {
                let mut policy = agent.eval_policy();
                evaluator.evaluate(&mut policy)?
            };
            info!(
                "Evaluation at step {}: mean return {:.3}, mean episode length {:.1}, {} episodes",
                env_steps,
                stats.mean_return(),
                stats.mean_episode_length(),
                stats.n_episodes
            );

            let mut record = stats.to_record();
            record.insert("datetime", RecordValue::DateTime(Local::now()));
            recorder.store(record);
            recorder.flush(env_steps as i64);
            evaluations.push((env_steps, stats));
        }

        let counters = agent.counters();
        info!(
            "Finished training: {} steps, {} episodes, {} opt steps, {} target syncs",
            counters.env_steps, counters.episodes, counters.opt_steps, counters.target_syncs
        );

        Ok(TrainingReport {
            counters,
            evaluations,
        })
    }
}
