use super::policy::{argmax_by, Candidate, Policy};

use crate::errors::BanditError;
use crate::rng::SharedRng;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Picks the arm with the highest single posterior draw.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ThompsonSampling;

impl Policy for ThompsonSampling {
    fn choose(
        &self,
        arms: &[Candidate<'_>],
        context: Option<ArrayView2<'_, f64>>,
        _rng: &SharedRng,
    ) -> Result<usize, BanditError> {
        argmax_by(arms, |arm| {
            arm.sample(context, 1)?
                .first()
                .copied()
                .ok_or(BanditError::LearnerUnset)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::policy::tests::{candidates, make_arms};

    const SEED: Option<u64> = Some(1234);

    #[test]
    fn draw_best() {
        let rng = SharedRng::new(SEED);
        let arms = make_arms(&[0.0, 100.0], &rng);

        for _ in 0..10 {
            assert_eq!(
                ThompsonSampling.choose(&candidates(&arms), None, &rng).unwrap(),
                1
            );
        }
    }

    #[test]
    fn close_arms_are_both_drawn() {
        let rng = SharedRng::new(SEED);
        let arms = make_arms(&[0.0, 0.1], &rng);

        let firsts = (0..200)
            .filter(|_| ThompsonSampling.choose(&candidates(&arms), None, &rng).unwrap() == 0)
            .count();
        assert!(firsts > 0 && firsts < 200);
    }

    #[test]
    fn draw_empty() {
        let rng = SharedRng::new(SEED);
        assert!(ThompsonSampling.choose(&[], None, &rng).is_err());
    }
}
