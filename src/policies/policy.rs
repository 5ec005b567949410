use super::epsilon_greedy::EpsilonGreedy;
use super::thompson_sampling::ThompsonSampling;
use super::ucb::UpperConfidenceBound;

use crate::arm::Sample;
use crate::errors::BanditError;
use crate::rng::SharedRng;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// An arm as seen by a policy: its name and its posterior.
#[derive(Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub arm: &'a dyn Sample,
}

/// Selection rule over the arms of an agent.
///
/// Returns the index into `arms` of the chosen arm. Implementations must take
/// all randomness from `rng` and must not hold its lock while sampling an arm.
pub trait Policy: Send + Sync {
    fn choose(
        &self,
        arms: &[Candidate<'_>],
        context: Option<ArrayView2<'_, f64>>,
        rng: &SharedRng,
    ) -> Result<usize, BanditError>;
}

impl<F> Policy for F
where
    F: Fn(&[Candidate<'_>], Option<ArrayView2<'_, f64>>, &SharedRng) -> Result<usize, BanditError>
        + Send
        + Sync,
{
    fn choose(
        &self,
        arms: &[Candidate<'_>],
        context: Option<ArrayView2<'_, f64>>,
        rng: &SharedRng,
    ) -> Result<usize, BanditError> {
        self(arms, context, rng)
    }
}

/// Wraps a closure as a shared policy.
pub fn policy_fn<F>(f: F) -> Arc<dyn Policy>
where
    F: Fn(&[Candidate<'_>], Option<ArrayView2<'_, f64>>, &SharedRng) -> Result<usize, BanditError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Index of the arm with the highest `score`, the first one on ties.
pub(super) fn argmax_by<F>(arms: &[Candidate<'_>], mut score: F) -> Result<usize, BanditError>
where
    F: FnMut(&dyn Sample) -> Result<f64, BanditError>,
{
    let scores = arms
        .iter()
        .map(|candidate| score(candidate.arm))
        .collect::<Result<Vec<f64>, BanditError>>()?;

    scores
        .iter()
        .enumerate()
        .rev()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(index, _)| index)
        .ok_or(BanditError::NoArms)
}

pub(super) fn default_samples() -> usize {
    1000
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PolicyType {
    EpsilonGreedy {
        #[serde(default = "default_epsilon")]
        epsilon: f64,
        #[serde(default = "default_samples")]
        samples: usize,
    },
    ThompsonSampling,
    UpperConfidenceBound {
        #[serde(default = "default_alpha")]
        alpha: f64,
        #[serde(default = "default_samples")]
        samples: usize,
    },
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_alpha() -> f64 {
    0.68
}

impl Default for PolicyType {
    fn default() -> Self {
        PolicyType::ThompsonSampling
    }
}

impl PolicyType {
    pub fn into_inner(self) -> Arc<dyn Policy> {
        match self {
            PolicyType::EpsilonGreedy { epsilon, samples } => {
                Arc::new(EpsilonGreedy::new(epsilon, samples))
            }
            PolicyType::ThompsonSampling => Arc::new(ThompsonSampling),
            PolicyType::UpperConfidenceBound { alpha, samples } => {
                Arc::new(UpperConfidenceBound::new(alpha, samples))
            }
        }
    }
}
