//! Default implementation of the [`Evaluator`] trait.
use super::{EvalStats, Evaluator};
use crate::{Env, Policy};
use anyhow::Result;
use log::debug;

/// Runs a fixed number of environment steps and averages over episodes.
///
/// Episodes end on termination or truncation by the environment, or after
/// `max_episode_steps` steps. When the step budget runs out in the middle of
/// an episode, that partial episode is discarded from the statistics, unless
/// no episode finished at all; then the partial episode is counted so that
/// the run still reports a return.
///
/// The evaluator owns its environment, separate from the training environment.
pub struct DefaultEvaluator<E: Env> {
    n_steps: usize,
    max_episode_steps: usize,
    n_episodes_total: usize,
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration of the environment.
    /// * `seed` - Random seed of the environment.
    /// * `n_steps` - Environment steps per evaluation.
    /// * `max_episode_steps` - Step cap of an episode.
    pub fn new(config: &E::Config, seed: i64, n_steps: usize, max_episode_steps: usize) -> Result<Self> {
        Ok(Self {
            n_steps,
            max_episode_steps,
            n_episodes_total: 0,
            env: E::build(config, seed)?,
        })
    }

    /// The evaluation environment.
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<EvalStats> {
        let mut stats = EvalStats {
            n_steps: 0,
            n_episodes: 0,
            total_reward: 0.0,
            total_episode_steps: 0,
        };
        let mut r_episode = 0f32;
        let mut episode_steps = 0;
        let mut obs = self.env.reset_with_index(self.n_episodes_total)?;

        while stats.n_steps < self.n_steps {
            let act = policy.sample(&obs)?;
            let (step, _) = self.env.step(act)?;
            stats.n_steps += 1;
            episode_steps += 1;
            r_episode += step.reward;

            if step.is_done() || episode_steps >= self.max_episode_steps {
                stats.n_episodes += 1;
                stats.total_reward += r_episode;
                stats.total_episode_steps += episode_steps;
                self.n_episodes_total += 1;
                r_episode = 0.0;
                episode_steps = 0;
                if stats.n_steps < self.n_steps {
                    obs = self.env.reset_with_index(self.n_episodes_total)?;
                }
            } else {
                obs = step.obs;
            }
        }

        if episode_steps > 0 {
            if stats.n_episodes == 0 {
                stats.n_episodes = 1;
                stats.total_reward = r_episode;
                stats.total_episode_steps = episode_steps;
            } else {
                debug!("Discarded a partial evaluation episode of {} steps", episode_steps);
            }
        }

        Ok(stats)
    }
}
