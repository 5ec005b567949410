use super::modes::{Attribution, ContextGate, Drift, Modes, UniqueId};
use super::state::AgentState;

use crate::arm::{Arm, ArmLike, Sample};
use crate::errors::{BanditError, PersistenceError};
use crate::learner::Learner;
use crate::policies::{Candidate, Policy};
use crate::rng::SharedRng;

use ndarray::{ArrayView1, ArrayView2};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One bandit instance: its arms, the shared random stream and the
/// pull/sample/update state machine.
///
/// Not meant for concurrent use: wrap it (see [`crate::actors::AgentActor`])
/// or keep one instance per decision stream.
pub struct Agent<A: ArmLike = Arm> {
    arms: BTreeMap<String, A>,
    order: Vec<String>,
    policy: Arc<dyn Policy>,
    rng: SharedRng,
    modes: Modes,
    last_arm_pulled: Option<String>,
    attribution: Attribution,
    context_gate: ContextGate,
    drift: Drift,
}

impl<A: ArmLike> Agent<A> {
    /// `arms` keeps the declaration order; policies see the arms in that order.
    pub(super) fn new(
        arms: Vec<(String, A)>,
        policy: Arc<dyn Policy>,
        rng: SharedRng,
        modes: Modes,
    ) -> Self {
        let order = arms.iter().map(|(name, _)| name.clone()).collect();
        Self {
            arms: arms.into_iter().collect(),
            order,
            policy,
            rng,
            modes,
            last_arm_pulled: None,
            attribution: Attribution::new(modes.delayed_reward),
            context_gate: ContextGate::new(modes.contextual),
            drift: Drift::new(modes.restless),
        }
    }

    pub fn arms(&self) -> &BTreeMap<String, A> {
        &self.arms
    }

    pub fn arm(&self, name: &str) -> Option<&A> {
        self.arms.get(name)
    }

    /// Arm names in declaration order.
    pub fn arm_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn rng(&self) -> &SharedRng {
        &self.rng
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn last_arm_pulled(&self) -> Option<&str> {
        self.last_arm_pulled.as_deref()
    }

    /// Ids awaiting their reward, present only for delayed-reward agents.
    pub fn pending(&self) -> Option<&HashMap<UniqueId, String>> {
        self.attribution.pending()
    }

    fn choose(&self, context: Option<ArrayView2<f64>>) -> Result<&str, BanditError> {
        let candidates = self
            .order
            .iter()
            .filter_map(|name| self.arms.get_key_value(name))
            .map(|(name, arm)| Candidate {
                name: name.as_str(),
                arm: arm as &dyn Sample,
            })
            .collect::<Vec<_>>();

        let index = self.policy.choose(&candidates, context, &self.rng)?;
        candidates
            .get(index)
            .map(|candidate| candidate.name)
            .ok_or(BanditError::InvalidChoice(index))
    }

    /// Lets the policy choose an arm and pulls it.
    ///
    /// Delayed-reward agents need a `unique_id` that is not already pending;
    /// the chosen arm is recorded under it once its action has run.
    pub fn pull(
        &mut self,
        context: Option<ArrayView2<f64>>,
        unique_id: Option<UniqueId>,
    ) -> Result<(), BanditError> {
        self.context_gate.check(context)?;
        self.attribution.check_pull(unique_id.as_ref())?;

        let name = self.choose(context)?.to_owned();
        self.last_arm_pulled = Some(name.clone());

        self.arms
            .get_mut(&name)
            .ok_or_else(|| BanditError::ArmNotFound(name.clone()))?
            .pull()?;

        debug!(arm = %name, unique_id = ?unique_id, "Pulled arm");
        self.attribution.record(unique_id, &name);
        Ok(())
    }

    /// Draws `size` reward estimates, re-running the policy for every draw.
    ///
    /// Each element may come from a different arm: the result follows the
    /// predictive distribution the policy induces, not one arm's posterior.
    pub fn sample(
        &self,
        context: Option<ArrayView2<f64>>,
        size: usize,
    ) -> Result<Vec<f64>, BanditError> {
        self.context_gate.check(context)?;

        (0..size)
            .map(|_| {
                let name = self.choose(context)?;
                self.arms
                    .get(name)
                    .ok_or_else(|| BanditError::ArmNotFound(name.to_owned()))?
                    .sample(context, 1)?
                    .first()
                    .copied()
                    .ok_or(BanditError::LearnerUnset)
            })
            .collect()
    }

    /// Attributes `outcome` to the arm it belongs to and updates that arm.
    ///
    /// Restless agents then decay every other arm once. Whether they all can
    /// is checked first, so a rejected update changes nothing.
    pub fn update(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
        unique_id: Option<UniqueId>,
    ) -> Result<(), BanditError> {
        self.context_gate.check(context)?;

        let name = self
            .attribution
            .resolve(unique_id.as_ref(), self.last_arm_pulled.as_deref())?;
        self.drift.check(&self.arms, &name)?;
        self.arms
            .get_mut(&name)
            .ok_or_else(|| BanditError::ArmNotFound(name.clone()))?
            .update(context, outcome)?;

        self.attribution
            .settle(unique_id.as_ref(), &mut self.last_arm_pulled);
        debug!(arm = %name, unique_id = ?unique_id, "Updated arm");

        self.drift.propagate(&mut self.arms, &name, context, outcome)
    }

    pub fn snapshot(&self) -> AgentState<A::State> {
        AgentState {
            rng: self.rng.detach(),
            arms: self
                .arms
                .iter()
                .map(|(name, arm)| (name.clone(), arm.state()))
                .collect(),
            pending: self.attribution.pending().cloned(),
        }
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Merges restored arm states into this instance.
    ///
    /// Arms of `states` this instance does not declare are dropped; declared
    /// arms missing from `states` keep the fresh learner they were built with.
    pub(super) fn reconcile(
        &mut self,
        mut states: BTreeMap<String, A::State>,
        pending: Option<HashMap<UniqueId, String>>,
    ) {
        let rng = self.rng.clone();
        for (name, arm) in self.arms.iter_mut() {
            match states.remove(name) {
                Some(state) => arm.restore(state, &rng),
                None => info!(arm = %name, "Initialized arm missing from restored state"),
            }
        }

        for name in states.keys() {
            warn!(arm = %name, "Dropped restored arm that is no longer declared");
        }

        let arms = &self.arms;
        self.attribution
            .restore(pending, |name| arms.contains_key(name));
        self.last_arm_pulled = None;
    }
}

impl<A: ArmLike> Sample for Agent<A> {
    fn sample(&self, context: Option<ArrayView2<f64>>, size: usize) -> Result<Vec<f64>, BanditError> {
        Agent::sample(self, context, size)
    }
}

/// A nested agent behaves like a plain non-delayed arm of its parent.
impl<A: ArmLike> ArmLike for Agent<A> {
    type State = AgentState<A::State>;

    fn pull(&mut self) -> Result<(), BanditError> {
        Agent::pull(self, None, None)
    }

    fn update(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError> {
        Agent::update(self, context, outcome, None)
    }

    fn decay(
        &mut self,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError> {
        self.check_decay()?;
        self.arms
            .values_mut()
            .try_for_each(|arm| arm.decay(context, outcome))
    }

    fn check_decay(&self) -> Result<(), BanditError> {
        self.arms.values().try_for_each(A::check_decay)
    }

    // pull takes neither a context nor an id
    fn nestable(&self) -> bool {
        !self.modes.contextual && !self.modes.delayed_reward
    }

    // keeps its own learners, only the stream is shared with the parent
    fn attach(&mut self, _learner: &dyn Learner, rng: &SharedRng) {
        self.rebind(rng);
    }

    fn rebind(&mut self, rng: &SharedRng) {
        self.rng = rng.clone();
        for arm in self.arms.values_mut() {
            arm.rebind(rng);
        }
    }

    fn state(&self) -> Self::State {
        self.snapshot()
    }

    fn restore(&mut self, state: Self::State, rng: &SharedRng) {
        self.reconcile(state.arms, state.pending);
        self.rebind(rng);
    }
}

/// The copy gets its own stream, detached at the current position, so two
/// instances never draw from one stream.
impl<A: ArmLike> Clone for Agent<A> {
    fn clone(&self) -> Self {
        let rng = self.rng.detach();
        let mut arms = self.arms.clone();
        for arm in arms.values_mut() {
            arm.rebind(&rng);
        }

        Self {
            arms,
            order: self.order.clone(),
            policy: self.policy.clone(),
            rng,
            modes: self.modes,
            last_arm_pulled: self.last_arm_pulled.clone(),
            attribution: self.attribution.clone(),
            context_gate: self.context_gate,
            drift: self.drift,
        }
    }
}

impl<A: ArmLike + fmt::Debug> fmt::Debug for Agent<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("arms", &self.arms)
            .field("modes", &self.modes)
            .field("last_arm_pulled", &self.last_arm_pulled)
            .field("pending", &self.attribution.pending())
            .finish_non_exhaustive()
    }
}
