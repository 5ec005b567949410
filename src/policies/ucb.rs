use super::policy::{argmax_by, Candidate, Policy};

use crate::errors::BanditError;
use crate::rng::SharedRng;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Bayesian upper confidence bound: picks the arm whose `alpha` quantile,
/// estimated from `samples` posterior draws, is highest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpperConfidenceBound {
    alpha: f64,
    samples: usize,
}

impl UpperConfidenceBound {
    pub fn new(alpha: f64, samples: usize) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            samples: samples.max(1),
        }
    }
}

// linear interpolation between the two closest order statistics
fn quantile(mut values: Vec<f64>, q: f64) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    values[lower] + weight * (values[upper] - values[lower])
}

impl Policy for UpperConfidenceBound {
    fn choose(
        &self,
        arms: &[Candidate<'_>],
        context: Option<ArrayView2<'_, f64>>,
        _rng: &SharedRng,
    ) -> Result<usize, BanditError> {
        argmax_by(arms, |arm| {
            let draws = arm.sample(context, self.samples)?;
            if draws.is_empty() {
                return Err(BanditError::LearnerUnset);
            }
            Ok(quantile(draws, self.alpha))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::policy::tests::{candidates, make_arms};

    const SEED: Option<u64> = Some(1234);

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(vec![3.0, 1.0, 2.0], 0.5), 2.0);
        assert_eq!(quantile(vec![0.0, 1.0], 0.25), 0.25);
        assert_eq!(quantile(vec![4.0], 0.9), 4.0);
    }

    #[test]
    fn draw_best() {
        let rng = SharedRng::new(SEED);
        let arms = make_arms(&[0.0, 5.0, 1.0], &rng);
        let policy = UpperConfidenceBound::new(0.68, 200);

        assert_eq!(policy.choose(&candidates(&arms), None, &rng).unwrap(), 1);
    }

    #[test]
    fn draw_empty() {
        let rng = SharedRng::new(SEED);
        let policy = UpperConfidenceBound::new(0.68, 10);
        assert!(policy.choose(&[], None, &rng).is_err());
    }
}
