use super::policy::{argmax_by, Candidate, Policy};

use crate::errors::BanditError;
use crate::rng::SharedRng;

use ndarray::ArrayView2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Explores a uniformly random arm with probability `epsilon`, otherwise
/// exploits the arm with the best posterior mean estimated from `samples` draws.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f64,
    samples: usize,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, samples: usize) -> Self {
        Self {
            epsilon,
            samples: samples.max(1),
        }
    }
}

impl Policy for EpsilonGreedy {
    fn choose(
        &self,
        arms: &[Candidate<'_>],
        context: Option<ArrayView2<'_, f64>>,
        rng: &SharedRng,
    ) -> Result<usize, BanditError> {
        if arms.is_empty() {
            return Err(BanditError::NoArms);
        }

        if rng.with(|rng| rng.random::<f64>()) < self.epsilon {
            return Ok(rng.with(|rng| rng.random_range(0..arms.len())));
        }

        argmax_by(arms, |arm| {
            let draws = arm.sample(context, self.samples)?;
            Ok(draws.iter().sum::<f64>() / draws.len() as f64)
        })
    }
}
