//! Evaluation policy.
use super::explorer::epsilon_greedy;
use crate::{Env, Policy, QFunction};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

/// Epsilon-greedy policy with a constant epsilon on the online network of a
/// Q-function.
///
/// The policy holds a shared reference to the Q-function and never updates it.
pub struct EvalPolicy<'a, Q: QFunction> {
    qnet: &'a Q,
    eps: f64,
    rng: StdRng,
}

impl<'a, Q: QFunction> EvalPolicy<'a, Q> {
    /// Constructs the policy.
    pub fn new(qnet: &'a Q, eps: f64, seed: u64) -> Self {
        Self {
            qnet,
            eps,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Epsilon of the policy.
    pub fn eps(&self) -> f64 {
        self.eps
    }
}

impl<'a, E, Q> Policy<E> for EvalPolicy<'a, Q>
where
    E: Env<Obs = Q::Obs>,
    Q: QFunction,
{
    fn sample(&mut self, obs: &E::Obs) -> Result<usize> {
        let q = self.qnet.evaluate(&self.qnet.vectorize(obs), false)?;
        Ok(epsilon_greedy(&q, self.eps, &mut self.rng))
    }
}
