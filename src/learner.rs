use crate::errors::LearnerError;
use crate::rng::SharedRng;

use ndarray::{ArrayView1, ArrayView2};
use std::fmt::Debug;

impl Clone for Box<dyn Learner> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedLearner {
    fn clone_box(&self) -> Box<dyn Learner>;
}

impl<T> CloneBoxedLearner for T
where
    T: Learner + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

/// Statistical model backing an arm.
///
/// `x` is always observations x features; `y` has one entry per row of `x`.
/// Implementations keep the bound stream out of their serialized state: it is
/// re-bound by the owning agent after a restore.
#[typetag::serde(tag = "type")]
pub trait Learner: Send + CloneBoxedLearner + Debug {
    /// Draws `size` values from the posterior predictive at `x`.
    fn sample(&self, x: ArrayView2<f64>, size: usize) -> Result<Vec<f64>, LearnerError>;

    fn partial_fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), LearnerError>;

    fn bind_rng(&mut self, rng: SharedRng);

    /// Forgets part of the evidence gathered so far. Only restless agents call it.
    fn decay(&mut self, _x: ArrayView2<f64>) -> Result<(), LearnerError> {
        Err(LearnerError::DecayUnsupported)
    }

    /// Must return true whenever `decay` is overridden.
    fn supports_decay(&self) -> bool {
        false
    }
}
