//! Test doubles shared by the unit tests.

use crate::arm::ArmState;
use crate::errors::LearnerError;
use crate::learner::Learner;
use crate::rng::SharedRng;

use crate::arm::Arm;
use crate::errors::BanditError;
use crate::policies::{policy_fn, Policy};

use ndarray::{ArrayView1, ArrayView2};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub type Fit = (Vec<Vec<f64>>, Vec<f64>);

/// Unit-variance Normal posterior around a running mean that records every
/// fit and decay it receives.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordingLearner {
    pub mean: f64,
    pub count: usize,
    pub fits: Vec<Fit>,
    pub decays: Vec<Vec<Vec<f64>>>,
    pub supports_decay: bool,
    #[serde(skip)]
    rng: Option<SharedRng>,
}

impl RecordingLearner {
    pub fn new(mean: f64) -> Self {
        Self {
            mean,
            count: 0,
            fits: Vec::new(),
            decays: Vec::new(),
            supports_decay: true,
            rng: None,
        }
    }

    pub fn without_decay(mut self) -> Self {
        self.supports_decay = false;
        self
    }
}

#[typetag::serde]
impl Learner for RecordingLearner {
    fn sample(&self, _x: ArrayView2<f64>, size: usize) -> Result<Vec<f64>, LearnerError> {
        let rng = self.rng.as_ref().ok_or(LearnerError::RngUnbound)?;
        let normal =
            Normal::new(self.mean, 1.0).map_err(|e| LearnerError::Numerical(e.to_string()))?;
        Ok(rng.with(|rng| (0..size).map(|_| normal.sample(rng)).collect()))
    }

    fn partial_fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), LearnerError> {
        let rows = x.outer_iter().map(|row| row.to_vec()).collect();
        self.fits.push((rows, y.to_vec()));
        for value in y.iter() {
            self.count += 1;
            self.mean += (value - self.mean) / self.count as f64;
        }
        Ok(())
    }

    fn bind_rng(&mut self, rng: SharedRng) {
        self.rng = Some(rng);
    }

    fn decay(&mut self, x: ArrayView2<f64>) -> Result<(), LearnerError> {
        if !self.supports_decay {
            return Err(LearnerError::DecayUnsupported);
        }
        self.decays.push(x.outer_iter().map(|row| row.to_vec()).collect());
        Ok(())
    }

    fn supports_decay(&self) -> bool {
        self.supports_decay
    }
}

fn learner_json(state: &ArmState) -> serde_json::Value {
    serde_json::to_value(state).expect("arm state serializes")["learner"].clone()
}

pub fn fits_of(state: &ArmState) -> Vec<Fit> {
    serde_json::from_value(learner_json(state)["fits"].clone()).expect("fits are recorded")
}

/// Design matrix of every decay, in order.
pub fn decays_of(state: &ArmState) -> Vec<Vec<Vec<f64>>> {
    serde_json::from_value(learner_json(state)["decays"].clone()).expect("decays are recorded")
}

/// Whether running `f` draws from `rng`.
pub fn advances_stream(rng: &SharedRng, f: impl FnOnce()) -> bool {
    use rand::Rng;

    let untouched: SharedRng =
        serde_json::from_value(serde_json::to_value(rng).expect("rng serializes"))
            .expect("rng deserializes");
    f();
    rng.with(|r| r.random::<u64>()) != untouched.with(|r| r.random::<u64>())
}

/// Policy that always picks the arm called `name`.
pub fn always(name: &'static str) -> Arc<dyn Policy> {
    policy_fn(move |arms, _, _| {
        arms.iter()
            .position(|candidate| candidate.name == name)
            .ok_or_else(|| BanditError::ArmNotFound(name.to_owned()))
    })
}

/// Policy that walks the arms in order, one step per call.
pub fn round_robin() -> (Arc<dyn Policy>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let policy = policy_fn(move |arms, _, _| Ok(counter.fetch_add(1, Ordering::SeqCst) % arms.len()));
    (policy, calls)
}

pub fn plain_arm() -> Arm {
    Arm::new(|| {}, |draw| draw)
}

/// Arm whose action bumps `pulls`.
pub fn counting_arm(pulls: &Arc<AtomicUsize>) -> Arm {
    let pulls = pulls.clone();
    Arm::new(
        move || {
            pulls.fetch_add(1, Ordering::SeqCst);
        },
        |draw| draw,
    )
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
