//! DQN learner.
use super::{
    config::DqnConfig,
    explorer::{epsilon_greedy, EpsilonGreedy, ExplorationMode},
    policy::EvalPolicy,
};
use crate::{
    error::DeepqError,
    record::{Record, RecordValue},
    replay_buffer::{Transition, TransitionBatch},
    Env, ExperienceBufferBase, QBatch, QFunction, ReplayBufferBase, StateMonitor,
};
use anyhow::Result;
use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

/// Step counters of a [`Dqn`] learner.
///
/// All counters start at zero and only increase, except `episode_steps`
/// which is reset at the end of every episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounters {
    /// Environment steps taken in training.
    pub env_steps: usize,

    /// Environment steps taken in the current episode.
    pub episode_steps: usize,

    /// Optimization steps, i.e., batch updates of the Q-function.
    pub opt_steps: usize,

    /// Synchronizations of the target network.
    pub target_syncs: usize,

    /// Finished episodes, terminated or truncated.
    pub episodes: usize,
}

/// DQN learner.
///
/// A call of [`Dqn::train_step`] takes one environment step with the
/// epsilon-greedy policy on the online network, pushes the transition into the
/// replay memory and, once the memory holds `replay_start_size` transitions,
/// performs an optimization step with the Bellman target
///
/// `y = r` if the transition is terminal, `y = r + gamma * max_a Q_target(o', a)` otherwise.
///
/// The target network is synchronized with the online network every
/// `stale_update_freq` optimization steps.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Obs = E::Obs>,
    R: ExperienceBufferBase<Item = Transition<E::Obs>>
        + ReplayBufferBase<Batch = TransitionBatch<E::Obs>>,
{
    env: E,
    qnet: Q,
    buffer: R,
    obs: Option<E::Obs>,
    discount_factor: f64,
    batch_size: usize,
    replay_start_size: usize,
    stale_update_freq: usize,
    explorer: EpsilonGreedy,
    counters: StepCounters,
    episode_return: f32,
    seed: u64,
    rng: StdRng,
    monitor: Option<StateMonitor<E::Obs>>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: QFunction<Obs = E::Obs>,
    R: ExperienceBufferBase<Item = Transition<E::Obs>>
        + ReplayBufferBase<Batch = TransitionBatch<E::Obs>>,
{
    /// Constructs DQN learner.
    ///
    /// Fails if the configuration is invalid or the number of outputs of the
    /// Q-function differs from the size of the action set of the environment.
    pub fn build(config: &DqnConfig, env: E, qnet: Q, buffer: R) -> Result<Self> {
        config.validate(buffer.capacity())?;

        let n_actions = env.action_set().len();
        if qnet.n_actions() != n_actions {
            return Err(DeepqError::InvalidConfig(format!(
                "the Q-function has {} outputs but the environment has {} actions",
                qnet.n_actions(),
                n_actions
            ))
            .into());
        }

        Ok(Self {
            env,
            qnet,
            buffer,
            obs: None,
            discount_factor: config.discount_factor,
            batch_size: config.batch_size,
            replay_start_size: config.replay_start_size,
            stale_update_freq: config.stale_update_freq,
            explorer: config.explorer.clone(),
            counters: StepCounters::default(),
            episode_return: 0.0,
            seed: config.seed,
            rng: StdRng::seed_from_u64(config.seed),
            monitor: None,
        })
    }

    /// Publishes the current observation to the monitor after every step.
    pub fn set_monitor(&mut self, monitor: StateMonitor<E::Obs>) {
        if let Some(obs) = &self.obs {
            monitor.publish(obs);
        }
        self.monitor = Some(monitor);
    }

    /// Read-only access to the Q-function.
    pub fn q_function(&self) -> &Q {
        &self.qnet
    }

    /// Read-only access to the replay memory.
    pub fn buffer(&self) -> &R {
        &self.buffer
    }

    /// Read-only access to the training environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The current observation, `None` before the first step.
    pub fn current_obs(&self) -> Option<&E::Obs> {
        self.obs.as_ref()
    }

    /// Current values of the step counters.
    pub fn counters(&self) -> StepCounters {
        self.counters
    }

    /// The explorer.
    pub fn explorer(&self) -> &EpsilonGreedy {
        &self.explorer
    }

    /// A non-learning policy on the online network with the evaluation epsilon.
    ///
    /// The policy borrows the learner immutably, so no optimization step or
    /// replay insertion can happen while it is alive.
    pub fn eval_policy(&self) -> EvalPolicy<'_, Q> {
        let eps = self.explorer.epsilon(ExplorationMode::Eval, self.counters.env_steps);
        let seed = self.seed ^ (self.counters.env_steps as u64);
        EvalPolicy::new(&self.qnet, eps, seed)
    }

    fn publish(&self, obs: &E::Obs) {
        if let Some(monitor) = &self.monitor {
            monitor.publish(obs);
        }
    }

    fn reset_env(&mut self) -> Result<E::Obs> {
        let obs = self.env.reset()?;
        self.publish(&obs);
        Ok(obs)
    }

    /// Action values of `obs`, one per action of the environment.
    ///
    /// Panics if the Q-function returns a different number of values.
    fn action_values(&self, obs: &E::Obs, use_target: bool) -> Result<Vec<f32>> {
        let q = self.qnet.evaluate(&self.qnet.vectorize(obs), use_target)?;
        assert_eq!(
            q.len(),
            self.env.action_set().len(),
            "The Q-function returned {} action values for {} actions",
            q.len(),
            self.env.action_set().len()
        );
        Ok(q)
    }

    fn max_value(q: &[f32]) -> f32 {
        q.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    fn update_critic(&mut self) -> Result<Record> {
        let batch = self.buffer.batch(self.batch_size)?;
        let gamma = self.discount_factor as f32;
        let mut inputs = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());

        for (obs, _, reward, next_obs, is_terminated) in batch.iter() {
            let target = if is_terminated {
                reward
            } else {
                reward + gamma * Self::max_value(&self.action_values(next_obs, true)?)
            };
            inputs.push(self.qnet.vectorize(obs));
            targets.push(target);
        }

        let acts = batch.act;
        self.qnet.update(QBatch {
            inputs,
            acts,
            targets,
        })
    }

    /// Performs an optimization step if the replay memory is filled enough.
    ///
    /// Returns `None` if the step was skipped.
    fn opt(&mut self) -> Result<Option<Record>> {
        if self.buffer.len() < self.replay_start_size {
            return Ok(None);
        }

        let record = self.update_critic()?;
        self.counters.opt_steps += 1;

        if self.counters.opt_steps % self.stale_update_freq == 0 {
            self.qnet.sync_target();
            self.counters.target_syncs += 1;
            debug!(
                "Synchronized target network at opt step {}",
                self.counters.opt_steps
            );
        }

        Ok(Some(record))
    }

    /// Performs a training step.
    ///
    /// The episode ends when the environment reports termination or truncation,
    /// or when the episode reaches `max_episode_steps`. The environment is
    /// then reset and the record of the step contains `episode_return` and
    /// `episode_length`.
    pub fn train_step(&mut self, max_episode_steps: usize) -> Result<Record> {
        let obs = match self.obs.take() {
            Some(obs) => obs,
            None => self.reset_env()?,
        };

        // Sample an action and apply it to the environment
        let eps = self
            .explorer
            .epsilon(ExplorationMode::Train, self.counters.env_steps);
        let act = {
            let q = self.action_values(&obs, false)?;
            epsilon_greedy(&q, eps, &mut self.rng)
        };
        let (step, mut record) = self.env.step(act)?;
        let is_truncated = step.is_truncated;
        trace!("act = {}, reward = {}", act, step.reward);

        // Push transition
        let next_obs = step.obs;
        self.buffer.push(Transition {
            obs,
            act,
            reward: step.reward,
            next_obs: next_obs.clone(),
            is_terminated: step.is_terminated,
        })?;
        self.counters.env_steps += 1;
        self.counters.episode_steps += 1;
        self.episode_return += step.reward;
        record.insert("epsilon", RecordValue::Scalar(eps as f32));

        // Optimization step
        if let Some(record_opt) = self.opt()? {
            record.merge_inplace(record_opt);
        }

        // End of episode
        if step.is_terminated || is_truncated || self.counters.episode_steps >= max_episode_steps {
            debug!(
                "Episode {} finished: {} steps, return {}",
                self.counters.episodes, self.counters.episode_steps, self.episode_return
            );
            record.insert("episode_return", RecordValue::Scalar(self.episode_return));
            record.insert(
                "episode_length",
                RecordValue::Scalar(self.counters.episode_steps as f32),
            );
            self.counters.episodes += 1;
            self.counters.episode_steps = 0;
            self.episode_return = 0.0;
            self.obs = Some(self.reset_env()?);
        } else {
            self.publish(&next_obs);
            self.obs = Some(next_obs);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{ChainEnv, ChainEnvConfig, ChainObs, TabularQ},
        replay_buffer::ReplayMemory,
    };

    type ChainDqn = Dqn<ChainEnv, TabularQ, ReplayMemory<ChainObs>>;

    fn random_explorer() -> EpsilonGreedy {
        EpsilonGreedy::new().eps_start(1.0).eps_final(1.0).anneal_steps(10)
    }

    fn build(
        config: &DqnConfig,
        env_config: ChainEnvConfig,
        init: f32,
        capacity: usize,
    ) -> Result<ChainDqn> {
        let env = ChainEnv::build(&env_config, 0)?;
        let qnet = TabularQ::new(env_config.len, 2, 0.5, init);
        Dqn::build(config, env, qnet, ReplayMemory::new(capacity, 7))
    }

    fn long_chain() -> ChainEnvConfig {
        ChainEnvConfig {
            len: 1000,
            truncate_after: None,
        }
    }

    fn small_config() -> DqnConfig {
        DqnConfig::default()
            .batch_size(2)
            .replay_start_size(5)
            .stale_update_freq(1000)
            .explorer(random_explorer())
    }

    #[test]
    fn no_update_before_replay_start_size() -> Result<()> {
        let mut dqn = build(&small_config(), long_chain(), 0.0, 10)?;

        for _ in 0..4 {
            let record = dqn.train_step(10_000)?;
            assert!(record.get("loss").is_none());
        }
        assert_eq!(dqn.counters().opt_steps, 0);
        assert_eq!(dqn.q_function().n_updates(), 0);

        // The fifth insertion makes the memory eligible
        let record = dqn.train_step(10_000)?;
        assert!(record.get_scalar("loss").is_ok());
        assert_eq!(dqn.counters().opt_steps, 1);
        assert_eq!(dqn.q_function().n_updates(), 1);
        Ok(())
    }

    #[test]
    fn memory_evicts_oldest_after_capacity() -> Result<()> {
        let mut dqn = build(&small_config(), long_chain(), 0.0, 10)?;
        let mut first_two = vec![];

        for _ in 0..11 {
            dqn.train_step(10_000)?;
            if first_two.len() < 2 {
                first_two.push(dqn.buffer().iter().last().unwrap().clone());
            }
        }

        assert_eq!(dqn.buffer().len(), 10);
        assert_eq!(dqn.buffer().n_pushed(), 11);
        let oldest = dqn.buffer().iter().next().unwrap();
        assert_eq!(oldest.obs, first_two[1].obs);
        assert_eq!(oldest.act, first_two[1].act);
        Ok(())
    }

    #[test]
    fn target_is_synced_once_per_stale_update_freq() -> Result<()> {
        let config = DqnConfig::default()
            .batch_size(2)
            .replay_start_size(2)
            .stale_update_freq(3)
            .explorer(random_explorer());
        let mut dqn = build(&config, long_chain(), 0.0, 100)?;

        for _ in 0..10 {
            dqn.train_step(10_000)?;
        }

        // Updates start at the second step
        assert_eq!(dqn.counters().opt_steps, 9);
        assert_eq!(dqn.counters().target_syncs, 3);
        assert_eq!(dqn.q_function().n_syncs(), 3);
        Ok(())
    }

    #[test]
    fn target_values_are_frozen_between_syncs() -> Result<()> {
        let config = DqnConfig::default()
            .batch_size(4)
            .replay_start_size(4)
            .stale_update_freq(1000)
            .explorer(random_explorer());
        let env_config = ChainEnvConfig {
            len: 2,
            truncate_after: None,
        };
        let mut dqn = build(&config, env_config, 0.0, 100)?;

        for _ in 0..50 {
            dqn.train_step(10_000)?;
        }

        let qnet = dqn.q_function();
        assert!(qnet.n_updates() > 0);
        assert_eq!(qnet.n_syncs(), 0);
        assert!(qnet.target().iter().flatten().all(|&v| v == 0.0));
        assert!(qnet.online()[0][1] > 0.0);
        Ok(())
    }

    #[test]
    fn terminal_target_is_the_reward() -> Result<()> {
        let config = DqnConfig::default()
            .discount_factor(0.99)
            .batch_size(4)
            .replay_start_size(4)
            .stale_update_freq(1000)
            .explorer(random_explorer());
        let env_config = ChainEnvConfig {
            len: 2,
            truncate_after: None,
        };
        let mut dqn = build(&config, env_config, 10.0, 100)?;

        for _ in 0..50 {
            dqn.train_step(10_000)?;
        }

        // `right` reaches the goal from position 0, `left` stays at position 0
        let batch = dqn.q_function().last_batch().unwrap();
        assert_eq!(batch.len(), 4);
        for (&act, &target) in batch.acts.iter().zip(&batch.targets) {
            if act == 1 {
                assert_eq!(target, 1.0);
            } else {
                assert!((target - 9.9).abs() < 1e-5);
            }
        }
        Ok(())
    }

    #[test]
    fn episode_ends_at_step_cap() -> Result<()> {
        let mut dqn = build(&small_config(), long_chain(), 0.0, 10)?;

        for t in 1..=7 {
            let record = dqn.train_step(3)?;
            if t % 3 == 0 {
                assert_eq!(record.get_scalar("episode_length")?, 3.0);
                assert_eq!(record.get_scalar("episode_return")?, 0.0);
            } else {
                assert!(record.get("episode_length").is_none());
            }
        }

        let counters = dqn.counters();
        assert_eq!(counters.episodes, 2);
        assert_eq!(counters.episode_steps, 1);
        assert_eq!(dqn.env().n_resets(), 3);

        // The cap is not a terminal state
        assert!(dqn.buffer().iter().all(|tr| !tr.is_terminated));
        Ok(())
    }

    #[test]
    fn episode_ends_at_terminal_state() -> Result<()> {
        let config = small_config().explorer(
            EpsilonGreedy::new()
                .eps_start(0.0)
                .eps_final(0.0)
                .anneal_steps(10),
        );
        let env_config = ChainEnvConfig {
            len: 3,
            truncate_after: None,
        };
        // Greedy ties go to `left`, so prefer `right` through the initial values
        let env = ChainEnv::build(&env_config, 0)?;
        let mut qnet = TabularQ::new(3, 2, 1.0, 0.0);
        let _ = qnet.update(QBatch {
            inputs: vec![vec![1.0, 1.0, 1.0]],
            acts: vec![1],
            targets: vec![1.0],
        });
        let mut dqn = Dqn::build(&config, env, qnet, ReplayMemory::new(10, 0))?;

        dqn.train_step(100)?;
        let record = dqn.train_step(100)?;

        assert_eq!(record.get_scalar("episode_return")?, 1.0);
        assert_eq!(record.get_scalar("episode_length")?, 2.0);
        assert_eq!(dqn.counters().episode_steps, 0);
        assert_eq!(dqn.current_obs(), Some(&ChainObs(0)));
        Ok(())
    }

    #[test]
    fn epsilon_is_recorded_every_step() -> Result<()> {
        let config = small_config().explorer(
            EpsilonGreedy::new()
                .eps_start(1.0)
                .eps_final(0.0)
                .anneal_steps(4),
        );
        let mut dqn = build(&config, long_chain(), 0.0, 10)?;

        let mut eps = vec![];
        for _ in 0..6 {
            eps.push(dqn.train_step(100)?.get_scalar("epsilon")?);
        }
        assert_eq!(eps, vec![1.0, 0.75, 0.5, 0.25, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn mismatched_number_of_actions_is_rejected() -> Result<()> {
        let env = ChainEnv::build(&long_chain(), 0)?;
        let qnet = TabularQ::new(1000, 3, 0.5, 0.0);
        let result = Dqn::build(&small_config(), env, qnet, ReplayMemory::new(10, 0));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn replay_start_larger_than_capacity_is_rejected() -> Result<()> {
        let result = build(&small_config().replay_start_size(11), long_chain(), 0.0, 10);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn monitor_receives_current_observation() -> Result<()> {
        let mut dqn = build(&small_config(), long_chain(), 0.0, 10)?;
        let monitor = StateMonitor::new();
        dqn.set_monitor(monitor.clone());
        assert!(monitor.snapshot().is_none());

        dqn.train_step(100)?;
        assert_eq!(monitor.snapshot().as_ref(), dqn.current_obs());
        Ok(())
    }

    /// Returns one action value more than the environment has actions.
    struct ExtraValue(TabularQ);

    impl QFunction for ExtraValue {
        type Obs = ChainObs;

        fn n_actions(&self) -> usize {
            self.0.n_actions()
        }

        fn vectorize(&self, obs: &ChainObs) -> Vec<f32> {
            self.0.vectorize(obs)
        }

        fn evaluate(&self, input: &[f32], use_target: bool) -> Result<Vec<f32>> {
            let mut q = self.0.evaluate(input, use_target)?;
            q.push(1.0);
            Ok(q)
        }

        fn update(&mut self, batch: QBatch) -> Result<Record> {
            self.0.update(batch)
        }

        fn sync_target(&mut self) {
            self.0.sync_target()
        }
    }

    #[test]
    #[should_panic(expected = "returned 3 action values for 2 actions")]
    fn wrong_number_of_action_values_panics() {
        let config = small_config().explorer(
            EpsilonGreedy::new()
                .eps_start(0.0)
                .eps_final(0.0)
                .anneal_steps(10),
        );
        let env = ChainEnv::build(&long_chain(), 0).unwrap();
        let qnet = ExtraValue(TabularQ::new(1000, 2, 0.5, 0.0));
        let mut dqn = Dqn::build(&config, env, qnet, ReplayMemory::new(10, 0)).unwrap();
        let _ = dqn.train_step(100);
    }
}
