use crate::errors::{BanditError, LearnerError};
use crate::learner::Learner;
use crate::rng::SharedRng;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type Action = Arc<dyn Fn() + Send + Sync>;
pub type RewardFunction = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Posterior sampling, the part of an arm a policy needs to see.
pub trait Sample {
    fn sample(&self, context: Option<ArrayView2<f64>>, size: usize) -> Result<Vec<f64>, BanditError>;
}

/// Capability shared by plain arms and whole agents, so an agent can be used
/// as an arm of another agent.
pub trait ArmLike: Sample + Clone + Send {
    type State: Serialize + DeserializeOwned + Send;

    fn pull(&mut self) -> Result<(), BanditError>;

    /// Feeds an observation. Without a context the outcome is fitted against a
    /// column of ones (bias-only).
    fn update(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError>;

    fn decay(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError>;

    /// Fails with the error `decay` would return for lack of a capable learner.
    fn check_decay(&self) -> Result<(), BanditError>;

    /// Whether this prototype can be driven through `pull`, which passes no
    /// context and no unique id.
    fn nestable(&self) -> bool {
        true
    }

    /// Called once when a prototype is copied into an agent instance.
    fn attach(&mut self, learner: &dyn Learner, rng: &SharedRng);

    /// Points whatever learners this arm owns at `rng`, keeping their state.
    fn rebind(&mut self, rng: &SharedRng);

    fn state(&self) -> Self::State;

    /// Replaces learned state with `state` and rebinds it to `rng`.
    fn restore(&mut self, state: Self::State, rng: &SharedRng);
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArmState {
    pub learner: Option<Box<dyn Learner>>,
}

#[derive(Clone)]
pub struct Arm {
    action: Action,
    reward_function: RewardFunction,
    learner: Option<Box<dyn Learner>>,
}

impl Arm {
    pub fn new<F, R>(action: F, reward_function: R) -> Self
    where
        F: Fn() + Send + Sync + 'static,
        R: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            reward_function: Arc::new(reward_function),
            learner: None,
        }
    }

    pub fn with_learner(mut self, learner: Box<dyn Learner>) -> Self {
        self.learner = Some(learner);
        self
    }

    pub fn learner(&self) -> Option<&dyn Learner> {
        self.learner.as_deref()
    }

    fn learner_mut(&mut self) -> Result<&mut Box<dyn Learner>, BanditError> {
        self.learner.as_mut().ok_or(BanditError::LearnerUnset)
    }
}

/// Design matrix for a fit: the given context, or a bias column matching `outcome`.
pub(crate) fn design_matrix(
    context: Option<ArrayView2<f64>>,
    outcome: ArrayView1<f64>,
) -> Result<Array2<f64>, BanditError> {
    match context {
        Some(context) if context.nrows() != outcome.len() => Err(BanditError::ShapeMismatch {
            rows: context.nrows(),
            outcomes: outcome.len(),
        }),
        Some(context) => Ok(context.to_owned()),
        None => Ok(Array2::ones((outcome.len(), 1))),
    }
}

impl Sample for Arm {
    fn sample(&self, context: Option<ArrayView2<f64>>, size: usize) -> Result<Vec<f64>, BanditError> {
        let learner = self.learner.as_ref().ok_or(BanditError::LearnerUnset)?;
        let draws = match context {
            Some(context) => learner.sample(context, size)?,
            None => learner.sample(Array2::ones((1, 1)).view(), size)?,
        };

        Ok(draws.into_iter().map(|draw| (self.reward_function)(draw)).collect())
    }
}

impl ArmLike for Arm {
    type State = ArmState;

    fn pull(&mut self) -> Result<(), BanditError> {
        if self.learner.is_none() {
            return Err(BanditError::LearnerUnset);
        }
        (self.action)();
        Ok(())
    }

    fn update(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError> {
        let learner = self.learner_mut()?;
        let x = design_matrix(context, outcome)?;
        learner.partial_fit(x.view(), outcome)?;
        Ok(())
    }

    fn decay(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError> {
        let learner = self.learner_mut()?;
        let x = design_matrix(context, outcome)?;
        learner.decay(x.view())?;
        Ok(())
    }

    fn check_decay(&self) -> Result<(), BanditError> {
        match self.learner.as_deref() {
            None => Err(BanditError::LearnerUnset),
            Some(learner) if !learner.supports_decay() => {
                Err(LearnerError::DecayUnsupported.into())
            }
            Some(_) => Ok(()),
        }
    }

    fn attach(&mut self, learner: &dyn Learner, rng: &SharedRng) {
        let mut learner = learner.clone_box();
        learner.bind_rng(rng.clone());
        self.learner = Some(learner);
    }

    fn rebind(&mut self, rng: &SharedRng) {
        if let Some(learner) = self.learner.as_mut() {
            learner.bind_rng(rng.clone());
        }
    }

    fn state(&self) -> ArmState {
        ArmState {
            learner: self.learner.clone(),
        }
    }

    fn restore(&mut self, state: ArmState, rng: &SharedRng) {
        // an arm saved without a learner keeps the fresh one it was attached with
        if let Some(learner) = state.learner {
            self.learner = Some(learner);
        }
        self.rebind(rng);
    }
}

impl fmt::Debug for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arm")
            .field("learner", &self.learner)
            .finish_non_exhaustive()
    }
}

/// Wraps a scalar outcome the way non-contextual callers pass it.
pub fn outcome(value: f64) -> Array1<f64> {
    Array1::from_elem(1, value)
}
