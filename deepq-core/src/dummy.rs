//! Small environment and Q-function used in tests.
use crate::{record::Record, ActionSet, Env, Obs, QBatch, QFunction, Step};
use anyhow::{bail, Result};

/// Position on a [`ChainEnv`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainObs(pub usize);

impl Obs for ChainObs {}

/// Configuration of [`ChainEnv`].
#[derive(Clone, Debug)]
pub struct ChainEnvConfig {
    /// Number of positions; the last one is the goal.
    pub len: usize,

    /// Truncates episodes after this many steps.
    pub truncate_after: Option<usize>,
}

impl Default for ChainEnvConfig {
    fn default() -> Self {
        Self {
            len: 5,
            truncate_after: None,
        }
    }
}

/// A deterministic chain of positions `0..len`.
///
/// Episodes start at position 0. Action `left` moves one position towards 0,
/// `right` one position towards the goal at `len - 1`. Reaching the goal gives
/// reward 1 and terminates the episode; all other steps give reward 0.
pub struct ChainEnv {
    config: ChainEnvConfig,
    actions: ActionSet,
    pos: usize,
    episode_steps: usize,
    n_resets: usize,
    reset_indices: Vec<usize>,
}

impl ChainEnv {
    /// Number of calls of [`Env::reset`] and [`Env::reset_with_index`].
    pub fn n_resets(&self) -> usize {
        self.n_resets
    }

    /// Indices given to [`Env::reset_with_index`].
    pub fn reset_indices(&self) -> &[usize] {
        &self.reset_indices
    }
}

impl Env for ChainEnv {
    type Config = ChainEnvConfig;
    type Obs = ChainObs;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        if config.len < 2 {
            bail!("a chain needs at least 2 positions, got {}", config.len);
        }
        Ok(Self {
            config: config.clone(),
            actions: ActionSet::new(["left", "right"]),
            pos: 0,
            episode_steps: 0,
            n_resets: 0,
            reset_indices: vec![],
        })
    }

    fn action_set(&self) -> &ActionSet {
        &self.actions
    }

    fn step(&mut self, act: usize) -> Result<(Step<Self>, Record)> {
        self.pos = match act {
            0 => self.pos.saturating_sub(1),
            1 => (self.pos + 1).min(self.config.len - 1),
            _ => bail!("invalid action index {}", act),
        };
        self.episode_steps += 1;

        let is_terminated = self.pos == self.config.len - 1;
        let is_truncated = !is_terminated
            && matches!(self.config.truncate_after, Some(n) if self.episode_steps >= n);
        let reward = if is_terminated { 1.0 } else { 0.0 };
        let step = Step::new(ChainObs(self.pos), act, reward, is_terminated, is_truncated);

        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<ChainObs> {
        self.pos = 0;
        self.episode_steps = 0;
        self.n_resets += 1;
        Ok(ChainObs(0))
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<ChainObs> {
        self.reset_indices.push(ix);
        self.reset()
    }
}

/// Tabular Q-function on [`ChainObs`] with one-hot inputs.
///
/// `update` moves `Q(x, a)` towards the target by `lr * (y - Q(x, a))`.
pub struct TabularQ {
    n_states: usize,
    n_actions: usize,
    lr: f32,
    online: Vec<Vec<f32>>,
    target: Vec<Vec<f32>>,
    n_updates: usize,
    n_syncs: usize,
    last_batch: Option<QBatch>,
}

impl TabularQ {
    /// Constructs a table with all values set to `init`.
    pub fn new(n_states: usize, n_actions: usize, lr: f32, init: f32) -> Self {
        let table = vec![vec![init; n_actions]; n_states];
        Self {
            n_states,
            n_actions,
            lr,
            online: table.clone(),
            target: table,
            n_updates: 0,
            n_syncs: 0,
            last_batch: None,
        }
    }

    /// Online table indexed by state, then action.
    pub fn online(&self) -> &[Vec<f32>] {
        &self.online
    }

    /// Target table indexed by state, then action.
    pub fn target(&self) -> &[Vec<f32>] {
        &self.target
    }

    /// Number of calls of [`QFunction::update`].
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Number of calls of [`QFunction::sync_target`].
    pub fn n_syncs(&self) -> usize {
        self.n_syncs
    }

    /// The batch given to the last update.
    pub fn last_batch(&self) -> Option<&QBatch> {
        self.last_batch.as_ref()
    }

    fn forward(table: &[Vec<f32>], input: &[f32], n_actions: usize) -> Vec<f32> {
        let mut q = vec![0f32; n_actions];
        for (x, row) in input.iter().zip(table.iter()) {
            for (q, w) in q.iter_mut().zip(row.iter()) {
                *q += x * w;
            }
        }
        q
    }
}

impl QFunction for TabularQ {
    type Obs = ChainObs;

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn vectorize(&self, obs: &ChainObs) -> Vec<f32> {
        let mut x = vec![0f32; self.n_states];
        x[obs.0] = 1.0;
        x
    }

    fn evaluate(&self, input: &[f32], use_target: bool) -> Result<Vec<f32>> {
        if input.len() != self.n_states {
            bail!("expected input of length {}, got {}", self.n_states, input.len());
        }
        let table = if use_target { &self.target } else { &self.online };
        Ok(Self::forward(table, input, self.n_actions))
    }

    fn update(&mut self, batch: QBatch) -> Result<Record> {
        let mut loss = 0f32;
        for ((x, &a), &y) in batch.inputs.iter().zip(&batch.acts).zip(&batch.targets) {
            let err = y - Self::forward(&self.online, x, self.n_actions)[a];
            loss += err * err;
            for (xi, row) in x.iter().zip(self.online.iter_mut()) {
                row[a] += self.lr * err * xi;
            }
        }
        self.n_updates += 1;
        let loss = loss / batch.len().max(1) as f32;
        self.last_batch = Some(batch);
        Ok(Record::from_scalar("loss", loss))
    }

    fn sync_target(&mut self) {
        self.target = self.online.clone();
        self.n_syncs += 1;
    }
}
