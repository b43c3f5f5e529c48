//! Exploration strategy of DQN.
use crate::error::DeepqError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selects which epsilon [`EpsilonGreedy::epsilon`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationMode {
    /// Epsilon annealed with the number of environment steps.
    Train,

    /// Constant epsilon for evaluation.
    Eval,
}

/// Annealed epsilon-greedy explorer.
///
/// In training, epsilon moves linearly from `eps_start` to `eps_final` over
/// `anneal_steps` environment steps and stays at `eps_final` afterwards:
///
/// `eps(t) = eps_start + (eps_final - eps_start) * min(1, t / anneal_steps)`
///
/// `anneal_steps == 0` jumps to `eps_final` immediately. `eps_start < eps_final`
/// is allowed; epsilon then increases. In evaluation, epsilon is `eps_test`.
///
/// The explorer has no mutable state; the step counter is given by the caller.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at step 0.
    pub eps_start: f64,

    /// Epsilon at and after `anneal_steps`.
    pub eps_final: f64,

    /// The number of steps over which epsilon is annealed.
    pub anneal_steps: usize,

    /// Epsilon in evaluation.
    pub eps_test: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_final: 0.1,
            anneal_steps: 1_000_000,
            eps_test: 0.05,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the number of annealing steps.
    pub fn anneal_steps(mut self, v: usize) -> Self {
        self.anneal_steps = v;
        self
    }

    /// Set the epsilon value in evaluation.
    pub fn eps_test(mut self, v: f64) -> Self {
        self.eps_test = v;
        self
    }

    /// Checks the configuration.
    ///
    /// Epsilons must be in `[0, 1]`. Annealing over zero steps between two
    /// different epsilons is rejected rather than treated as a jump.
    pub fn validate(&self) -> Result<(), DeepqError> {
        for (name, v) in [
            ("eps_start", self.eps_start),
            ("eps_final", self.eps_final),
            ("eps_test", self.eps_test),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(DeepqError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, v
                )));
            }
        }
        if self.anneal_steps == 0 && self.eps_start != self.eps_final {
            return Err(DeepqError::InvalidConfig(format!(
                "anneal_steps is 0 while eps_start ({}) differs from eps_final ({})",
                self.eps_start, self.eps_final
            )));
        }
        Ok(())
    }

    /// Returns epsilon at environment step `t`.
    pub fn epsilon(&self, mode: ExplorationMode, t: usize) -> f64 {
        match mode {
            ExplorationMode::Eval => self.eps_test,
            ExplorationMode::Train => {
                if t >= self.anneal_steps {
                    self.eps_final
                } else {
                    let frac = t as f64 / self.anneal_steps as f64;
                    self.eps_start + (self.eps_final - self.eps_start) * frac
                }
            }
        }
    }
}

/// Index of the largest action value; ties go to the lowest index.
///
/// Panics if `q` is empty.
pub fn greedy(q: &[f32]) -> usize {
    assert!(!q.is_empty(), "No action values to choose from");
    let mut best = 0;
    for (i, v) in q.iter().enumerate().skip(1) {
        if *v > q[best] {
            best = i;
        }
    }
    best
}

/// Uniformly random action with probability `eps`, [`greedy`] action otherwise.
pub fn epsilon_greedy(q: &[f32], eps: f64, rng: &mut impl Rng) -> usize {
    assert!(!q.is_empty(), "No action values to choose from");
    if rng.gen::<f64>() < eps {
        rng.gen_range(0..q.len())
    } else {
        greedy(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn explorer() -> EpsilonGreedy {
        EpsilonGreedy::new()
            .eps_start(1.0)
            .eps_final(0.1)
            .anneal_steps(100)
            .eps_test(0.05)
    }

    #[test]
    fn epsilon_is_annealed_linearly() {
        let e = explorer();
        assert_eq!(e.epsilon(ExplorationMode::Train, 0), 1.0);
        assert!((e.epsilon(ExplorationMode::Train, 50) - 0.55).abs() < 1e-12);
        assert_eq!(e.epsilon(ExplorationMode::Train, 100), 0.1);
        assert_eq!(e.epsilon(ExplorationMode::Train, 1_000), 0.1);

        let mut prev = f64::INFINITY;
        for t in 0..=100 {
            let eps = e.epsilon(ExplorationMode::Train, t);
            assert!(eps <= prev);
            assert!(eps >= 0.1);
            prev = eps;
        }
    }

    #[test]
    fn eval_mode_uses_test_epsilon() {
        let e = explorer();
        assert_eq!(e.epsilon(ExplorationMode::Eval, 0), 0.05);
        assert_eq!(e.epsilon(ExplorationMode::Eval, 50), 0.05);
    }

    #[test]
    fn zero_anneal_steps_jumps_to_final() {
        let e = explorer().anneal_steps(0);
        assert_eq!(e.epsilon(ExplorationMode::Train, 0), 0.1);
        assert!(e.validate().is_err());
        assert!(e.eps_start(0.1).validate().is_ok());
    }

    #[test]
    fn epsilon_may_anneal_upwards() {
        let e = explorer().eps_start(0.0).eps_final(0.5);
        assert!((e.epsilon(ExplorationMode::Train, 50) - 0.25).abs() < 1e-12);
        assert_eq!(e.epsilon(ExplorationMode::Train, 200), 0.5);
    }

    #[test]
    fn out_of_range_epsilon_is_rejected() {
        assert!(explorer().eps_test(1.5).validate().is_err());
        assert!(explorer().eps_final(-0.1).validate().is_err());
        assert!(explorer().validate().is_ok());
    }

    #[test]
    fn greedy_breaks_ties_by_lowest_index() {
        assert_eq!(greedy(&[0.0, 1.0, 1.0, 0.5]), 1);
        assert_eq!(greedy(&[2.0, 2.0]), 0);
        assert_eq!(greedy(&[-3.0, -1.0, -2.0]), 1);
    }

    #[test]
    fn zero_epsilon_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert_eq!(epsilon_greedy(&[0.3, 0.7, 0.7], 0.0, &mut rng), 1);
        }
    }

    #[test]
    fn full_epsilon_is_uniform() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut counts = [0usize; 4];
        for _ in 0..40_000 {
            counts[epsilon_greedy(&[0.0, 9.0, 0.0, 0.0], 1.0, &mut rng)] += 1;
        }
        for c in counts {
            assert!((c as f64 - 10_000.0).abs() < 600.0, "{:?}", counts);
        }
    }
}
