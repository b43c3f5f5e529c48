//! Linear Q-function.
use crate::vectorizer::StateVectorizer;
use anyhow::{ensure, Result};
use deepq_core::{error::DeepqError, record::Record, QBatch, QFunction};
use log::trace;
use ndarray::{Array2, ArrayView1};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration of [`LinearQ`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LinearQConfig {
    /// Step size of the gradient descent.
    pub learning_rate: f32,

    /// Initial weights are drawn uniformly from `[-init_scale, init_scale)`.
    /// Zero gives all-zero weights.
    pub init_scale: f32,

    /// Random seed of the weight initialization.
    pub seed: u64,
}

impl Default for LinearQConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            init_scale: 0.0,
            seed: 42,
        }
    }
}

impl LinearQConfig {
    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the scale of the initial weights.
    pub fn init_scale(mut self, v: f32) -> Self {
        self.init_scale = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), DeepqError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DeepqError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.init_scale >= 0.0 && self.init_scale.is_finite()) {
            return Err(DeepqError::InvalidConfig(format!(
                "init_scale must be non-negative, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}

/// Action values linear in the input, `Q(x) = W x`.
///
/// `W` is an `n_actions x input_dim` matrix. The online and target weights are
/// separate matrices; only [`QFunction::sync_target`] writes the target.
///
/// An update is one gradient descent step on
/// `L = 1/(2n) sum_i (W[a_i] x_i - y_i)^2` over the batch. The reported `loss`
/// is `2L`, the mean squared error before the step.
pub struct LinearQ<V: StateVectorizer> {
    vectorizer: V,
    learning_rate: f32,
    online: Array2<f32>,
    target: Array2<f32>,
}

impl<V: StateVectorizer> LinearQ<V> {
    /// Constructs the Q-function with `n_actions` outputs.
    pub fn build(config: &LinearQConfig, vectorizer: V, n_actions: usize) -> Result<Self> {
        config.validate()?;
        let shape = (n_actions, vectorizer.input_dim());
        let online = if config.init_scale > 0.0 {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let s = config.init_scale;
            Array2::from_shape_fn(shape, |_| rng.gen_range(-s..s))
        } else {
            Array2::zeros(shape)
        };

        Ok(Self {
            vectorizer,
            learning_rate: config.learning_rate,
            target: online.clone(),
            online,
        })
    }

    /// Online weights.
    pub fn online(&self) -> &Array2<f32> {
        &self.online
    }

    /// Target weights.
    pub fn target(&self) -> &Array2<f32> {
        &self.target
    }
}

impl<V: StateVectorizer> QFunction for LinearQ<V> {
    type Obs = V::Obs;

    fn n_actions(&self) -> usize {
        self.online.nrows()
    }

    fn vectorize(&self, obs: &Self::Obs) -> Vec<f32> {
        self.vectorizer.vectorize(obs)
    }

    fn evaluate(&self, input: &[f32], use_target: bool) -> Result<Vec<f32>> {
        ensure!(
            input.len() == self.online.ncols(),
            "Expected input of length {}, got {}",
            self.online.ncols(),
            input.len()
        );
        let w = if use_target { &self.target } else { &self.online };
        Ok(w.dot(&ArrayView1::from(input)).to_vec())
    }

    fn update(&mut self, batch: QBatch) -> Result<Record> {
        ensure!(!batch.is_empty(), "Empty batch");
        let n = batch.len() as f32;
        let mut grad = Array2::<f32>::zeros(self.online.raw_dim());
        let mut loss = 0f32;

        for ((input, &a), &y) in batch.inputs.iter().zip(&batch.acts).zip(&batch.targets) {
            ensure!(
                a < self.n_actions(),
                "Action index {} out of range for {} actions",
                a,
                self.n_actions()
            );
            ensure!(
                input.len() == self.online.ncols(),
                "Expected input of length {}, got {}",
                self.online.ncols(),
                input.len()
            );
            let x = ArrayView1::from(input.as_slice());
            let err = self.online.row(a).dot(&x) - y;
            loss += err * err;
            grad.row_mut(a).scaled_add(err / n, &x);
        }

        self.online.scaled_add(-self.learning_rate, &grad);
        let loss = loss / n;
        trace!("loss = {}", loss);

        Ok(Record::from_scalar("loss", loss))
    }

    fn sync_target(&mut self) {
        self.target.assign(&self.online);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{vectorizer::OneHotVectorizer, GridState};

    fn qnet(lr: f32) -> LinearQ<OneHotVectorizer> {
        let config = LinearQConfig::default().learning_rate(lr);
        LinearQ::build(&config, OneHotVectorizer::new(2, 2), 4).unwrap()
    }

    fn batch(qnet: &LinearQ<OneHotVectorizer>, s: GridState, a: usize, y: f32) -> QBatch {
        QBatch {
            inputs: vec![qnet.vectorize(&s)],
            acts: vec![a],
            targets: vec![y],
        }
    }

    #[test]
    fn update_moves_the_taken_action_only() -> Result<()> {
        let mut qnet = qnet(0.5);
        let s = GridState::new(1, 0);
        let x = qnet.vectorize(&s);

        let record = qnet.update(batch(&qnet, s, 2, -1.0))?;
        assert_eq!(record.get_scalar("loss")?, 1.0);
        assert_eq!(qnet.evaluate(&x, false)?, vec![0.0, 0.0, -0.5, 0.0]);

        // Other states are untouched with one-hot inputs
        let x0 = qnet.vectorize(&GridState::new(0, 0));
        assert_eq!(qnet.evaluate(&x0, false)?, vec![0.0; 4]);
        Ok(())
    }

    #[test]
    fn target_changes_only_on_sync() -> Result<()> {
        let mut qnet = qnet(1.0);
        let s = GridState::new(0, 1);
        let x = qnet.vectorize(&s);

        qnet.update(batch(&qnet, s, 0, 3.0))?;
        assert_eq!(qnet.evaluate(&x, true)?, vec![0.0; 4]);
        assert_eq!(qnet.evaluate(&x, false)?[0], 3.0);

        qnet.sync_target();
        assert_eq!(qnet.evaluate(&x, true)?, qnet.evaluate(&x, false)?);
        assert_eq!(qnet.target(), qnet.online());
        Ok(())
    }

    #[test]
    fn batch_gradient_is_averaged() -> Result<()> {
        let mut qnet = qnet(1.0);
        let s = GridState::new(1, 1);
        let x = qnet.vectorize(&s);
        let b = QBatch {
            inputs: vec![x.clone(), x.clone()],
            acts: vec![1, 1],
            targets: vec![2.0, 4.0],
        };

        let record = qnet.update(b)?;
        assert_eq!(record.get_scalar("loss")?, 10.0);
        assert_eq!(qnet.evaluate(&x, false)?[1], 3.0);
        Ok(())
    }

    #[test]
    fn wrong_input_length_is_an_error() {
        let qnet = qnet(0.1);
        assert!(qnet.evaluate(&[1.0, 0.0], false).is_err());
    }

    #[test]
    fn random_initialization_is_seeded() -> Result<()> {
        let config = LinearQConfig::default().init_scale(0.1).seed(3);
        let q1 = LinearQ::build(&config, OneHotVectorizer::new(3, 3), 4)?;
        let q2 = LinearQ::build(&config, OneHotVectorizer::new(3, 3), 4)?;
        assert_eq!(q1.online(), q2.online());
        assert_eq!(q1.online(), q1.target());
        assert!(q1.online().iter().all(|w| w.abs() < 0.1));
        Ok(())
    }

    #[test]
    fn non_positive_learning_rate_is_rejected() {
        let config = LinearQConfig::default().learning_rate(0.0);
        assert!(LinearQ::build(&config, OneHotVectorizer::new(2, 2), 4).is_err());
    }
}
