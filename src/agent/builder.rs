use super::agent::Agent;
use super::modes::Modes;
use super::state::AgentState;

use crate::arm::{Arm, ArmLike};
use crate::config::AgentSettings;
use crate::errors::{BanditError, PersistenceError};
use crate::learner::Learner;
use crate::policies::Policy;
use crate::rng::SharedRng;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Collects the template of an agent type: arm prototypes, the learner every
/// arm gets a copy of, the policy and the mode flags.
pub struct AgentBuilder<A: ArmLike = Arm> {
    learner: Box<dyn Learner>,
    policy: Arc<dyn Policy>,
    arms: Vec<(String, A)>,
    modes: Modes,
}

impl<A: ArmLike> AgentBuilder<A> {
    pub fn new(learner: Box<dyn Learner>, policy: Arc<dyn Policy>) -> Self {
        Self {
            learner,
            policy,
            arms: Vec::new(),
            modes: Modes::default(),
        }
    }

    pub fn from_settings(learner: Box<dyn Learner>, settings: &AgentSettings) -> Self {
        Self::new(learner, settings.policy.clone().into_inner()).modes(settings.modes())
    }

    pub fn arm(mut self, name: impl Into<String>, prototype: A) -> Self {
        self.arms.push((name.into(), prototype));
        self
    }

    pub fn modes(mut self, modes: Modes) -> Self {
        self.modes = modes;
        self
    }

    pub fn contextual(mut self, contextual: bool) -> Self {
        self.modes.contextual = contextual;
        self
    }

    pub fn delayed_reward(mut self, delayed_reward: bool) -> Self {
        self.modes.delayed_reward = delayed_reward;
        self
    }

    pub fn restless(mut self, restless: bool) -> Self {
        self.modes.restless = restless;
        self
    }

    pub fn build(self) -> Result<AgentType<A>, BanditError> {
        if self.arms.is_empty() {
            return Err(BanditError::NoArms);
        }

        let mut seen = HashSet::new();
        if let Some((name, _)) = self.arms.iter().find(|(name, _)| !seen.insert(name.as_str())) {
            return Err(BanditError::DuplicateArm(name.clone()));
        }

        if let Some((name, _)) = self.arms.iter().find(|(_, prototype)| !prototype.nestable()) {
            return Err(BanditError::NotNestable(name.clone()));
        }

        Ok(AgentType {
            learner: self.learner,
            policy: self.policy,
            prototypes: self.arms,
            modes: self.modes,
        })
    }
}

/// A validated template from which agent instances are constructed.
pub struct AgentType<A: ArmLike = Arm> {
    learner: Box<dyn Learner>,
    policy: Arc<dyn Policy>,
    prototypes: Vec<(String, A)>,
    modes: Modes,
}

impl<A: ArmLike> AgentType<A> {
    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn arm_names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.iter().map(|(name, _)| name.as_str())
    }

    /// Builds an instance with its own stream, seeded from `seed` or from entropy.
    pub fn instantiate(&self, seed: Option<u64>) -> Agent<A> {
        self.instantiate_with(SharedRng::new(seed))
    }

    fn instantiate_with(&self, rng: SharedRng) -> Agent<A> {
        let arms = self
            .prototypes
            .iter()
            .map(|(name, prototype)| {
                let mut arm = prototype.clone();
                arm.attach(self.learner.as_ref(), &rng);
                (name.clone(), arm)
            })
            .collect::<Vec<_>>();

        info!(arms = arms.len(), modes = ?self.modes, "Instantiated agent");
        Agent::new(arms, self.policy.clone(), rng, self.modes)
    }

    /// Rebuilds an instance from saved state against the current template.
    ///
    /// The restored stream is reused, not reseeded. Saved arms the template
    /// still declares keep their learner state; new arms start fresh.
    pub fn restore(&self, state: AgentState<A::State>) -> Agent<A> {
        let AgentState { rng, arms, pending } = state;
        let mut agent = self.instantiate_with(rng);
        agent.reconcile(arms, pending);
        info!(arms = agent.arms().len(), "Restored agent");
        agent
    }

    pub fn from_json(&self, json: &str) -> Result<Agent<A>, PersistenceError> {
        let state: AgentState<A::State> = serde_json::from_str(json)?;
        Ok(self.restore(state))
    }
}
