//! Transitions and batches of transitions.

/// A transition `(o_t, a_t, r_t, o_t+1, terminated_t)`.
///
/// Transitions are immutable once pushed into a replay memory;
/// sampling returns copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O> {
    /// Observation `o_t`.
    pub obs: O,

    /// Action index `a_t`.
    pub act: usize,

    /// Reward `r_t`.
    pub reward: f32,

    /// Next observation `o_t+1`.
    pub next_obs: O,

    /// Flag denoting if the episode terminated at `o_t+1`.
    pub is_terminated: bool,
}

/// A batch of transitions sampled from a replay memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch<O> {
    /// Observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<usize>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Next observations.
    pub next_obs: Vec<O>,

    /// Termination flags.
    pub is_terminated: Vec<bool>,

    /// Slot indices the transitions were sampled from.
    pub ix_sample: Vec<usize>,
}

impl<O> TransitionBatch<O> {
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: Vec::with_capacity(capacity),
            act: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            next_obs: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
            ix_sample: Vec::with_capacity(capacity),
        }
    }

    /// Appends a copy of the transition sampled from slot `ix`.
    pub fn push(&mut self, ix: usize, tr: &Transition<O>)
    where
        O: Clone,
    {
        self.obs.push(tr.obs.clone());
        self.act.push(tr.act);
        self.reward.push(tr.reward);
        self.next_obs.push(tr.next_obs.clone());
        self.is_terminated.push(tr.is_terminated);
        self.ix_sample.push(ix);
    }

    /// The number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Iterates over the transitions of the batch.
    pub fn iter(&self) -> impl Iterator<Item = (&O, usize, f32, &O, bool)> {
        (0..self.len()).map(move |i| {
            (
                &self.obs[i],
                self.act[i],
                self.reward[i],
                &self.next_obs[i],
                self.is_terminated[i],
            )
        })
    }
}
