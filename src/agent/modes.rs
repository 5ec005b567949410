use crate::arm::ArmLike;
use crate::errors::BanditError;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Mode flags fixed when an agent type is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    pub contextual: bool,
    pub delayed_reward: bool,
    pub restless: bool,
}

/// Caller-supplied identifier tying a delayed reward back to its pull.
///
/// Ids are compared by their text: `UniqueId::from(3u64)` and
/// `UniqueId::from("3")` are the same id. Persisted pending ids are JSON
/// object keys, which are text as well.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UniqueId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UniqueId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for UniqueId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for UniqueId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ContextGate {
    Required,
    Forbidden,
}

impl ContextGate {
    pub(super) fn new(contextual: bool) -> Self {
        if contextual {
            ContextGate::Required
        } else {
            ContextGate::Forbidden
        }
    }

    pub(super) fn check<T>(&self, context: Option<T>) -> Result<(), BanditError> {
        match (self, context.is_some()) {
            (ContextGate::Required, false) => Err(BanditError::ContextRequired),
            (ContextGate::Forbidden, true) => Err(BanditError::ContextForbidden),
            _ => Ok(()),
        }
    }
}

/// How an update finds the arm it belongs to.
#[derive(Clone, Debug)]
pub(super) enum Attribution {
    /// The arm chosen by the most recent pull.
    LastPull,
    /// The arm recorded under the caller's id at pull time.
    Delayed(HashMap<UniqueId, String>),
}

impl Attribution {
    pub(super) fn new(delayed_reward: bool) -> Self {
        if delayed_reward {
            Attribution::Delayed(HashMap::new())
        } else {
            Attribution::LastPull
        }
    }

    pub(super) fn pending(&self) -> Option<&HashMap<UniqueId, String>> {
        match self {
            Attribution::LastPull => None,
            Attribution::Delayed(pending) => Some(pending),
        }
    }

    /// Validates the id a pull was given, before anything is chosen or pulled.
    pub(super) fn check_pull(&self, unique_id: Option<&UniqueId>) -> Result<(), BanditError> {
        match (self, unique_id) {
            (Attribution::LastPull, None) => Ok(()),
            (Attribution::LastPull, Some(_)) => Err(BanditError::UniqueIdNotAccepted),
            (Attribution::Delayed(_), None) => Err(BanditError::MissingUniqueId),
            (Attribution::Delayed(pending), Some(id)) if pending.contains_key(id) => {
                Err(BanditError::UniqueIdInUse(id.clone()))
            }
            (Attribution::Delayed(_), Some(_)) => Ok(()),
        }
    }

    pub(super) fn record(&mut self, unique_id: Option<UniqueId>, arm: &str) {
        if let (Attribution::Delayed(pending), Some(id)) = (self, unique_id) {
            pending.insert(id, arm.to_owned());
        }
    }

    /// Name of the arm an update targets. Nothing is consumed yet.
    pub(super) fn resolve(
        &self,
        unique_id: Option<&UniqueId>,
        last_arm_pulled: Option<&str>,
    ) -> Result<String, BanditError> {
        match (self, unique_id) {
            (Attribution::LastPull, Some(_)) => Err(BanditError::UniqueIdNotAccepted),
            (Attribution::LastPull, None) => last_arm_pulled
                .map(str::to_owned)
                .ok_or(BanditError::NoPriorPull),
            (Attribution::Delayed(_), None) => Err(BanditError::MissingUniqueId),
            (Attribution::Delayed(pending), Some(id)) => pending
                .get(id)
                .cloned()
                .ok_or_else(|| BanditError::UnknownUniqueId(id.clone())),
        }
    }

    /// Consumes what `resolve` pointed at, once the update went through.
    pub(super) fn settle(&mut self, unique_id: Option<&UniqueId>, last_arm_pulled: &mut Option<String>) {
        match (self, unique_id) {
            (Attribution::Delayed(pending), Some(id)) => {
                pending.remove(id);
            }
            _ => {
                last_arm_pulled.take();
            }
        }
    }

    /// Adopts a restored pending map, keeping only ids whose arm still exists.
    pub(super) fn restore<F>(&mut self, restored: Option<HashMap<UniqueId, String>>, known: F)
    where
        F: Fn(&str) -> bool,
    {
        match (self, restored) {
            (Attribution::Delayed(pending), Some(restored)) => {
                for (id, arm) in restored {
                    if known(&arm) {
                        pending.insert(id, arm);
                    } else {
                        warn!(unique_id = %id, arm = %arm, "Dropping pending pull of removed arm");
                    }
                }
            }
            (Attribution::LastPull, Some(restored)) if !restored.is_empty() => {
                warn!(
                    count = restored.len(),
                    "Dropping pending pulls, agent no longer takes delayed rewards"
                );
            }
            _ => {}
        }
    }
}

/// Whether arms left out of an update drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Drift {
    Stationary,
    Restless,
}

impl Drift {
    pub(super) fn new(restless: bool) -> Self {
        if restless {
            Drift::Restless
        } else {
            Drift::Stationary
        }
    }

    /// Fails if any arm but `updated` could not be decayed.
    pub(super) fn check<A: ArmLike>(
        &self,
        arms: &BTreeMap<String, A>,
        updated: &str,
    ) -> Result<(), BanditError> {
        if *self == Drift::Stationary {
            return Ok(());
        }

        arms.iter()
            .filter(|(name, _)| name.as_str() != updated)
            .try_for_each(|(_, arm)| arm.check_decay())
    }

    /// Decays every arm but `updated`, once each.
    pub(super) fn propagate<A: ArmLike>(
        &self,
        arms: &mut BTreeMap<String, A>,
        updated: &str,
        context: Option<ArrayView2<f64>>,
        outcome: ArrayView1<f64>,
    ) -> Result<(), BanditError> {
        if *self == Drift::Stationary {
            return Ok(());
        }

        arms.iter_mut()
            .filter(|(name, _)| name.as_str() != updated)
            .try_for_each(|(_, arm)| arm.decay(context, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn context_gate() {
        let context = array![[1.0]];
        assert!(ContextGate::new(true).check(Some(context.view())).is_ok());
        assert!(matches!(
            ContextGate::new(true).check::<()>(None),
            Err(BanditError::ContextRequired)
        ));
        assert!(ContextGate::new(false).check::<()>(None).is_ok());
        assert!(matches!(
            ContextGate::new(false).check(Some(context.view())),
            Err(BanditError::ContextForbidden)
        ));
    }

    #[test]
    fn last_pull_attribution() {
        let mut attribution = Attribution::new(false);
        assert!(attribution.pending().is_none());
        assert!(attribution.check_pull(None).is_ok());
        assert!(matches!(
            attribution.check_pull(Some(&UniqueId::from("x"))),
            Err(BanditError::UniqueIdNotAccepted)
        ));
        assert!(matches!(
            attribution.resolve(None, None),
            Err(BanditError::NoPriorPull)
        ));

        let mut last = Some("a".to_owned());
        assert_eq!(attribution.resolve(None, last.as_deref()).unwrap(), "a");
        attribution.settle(None, &mut last);
        assert!(last.is_none());
    }

    #[test]
    fn delayed_attribution() {
        let mut attribution = Attribution::new(true);
        let id = UniqueId::from(7u64);
        assert!(matches!(
            attribution.check_pull(None),
            Err(BanditError::MissingUniqueId)
        ));
        assert!(attribution.check_pull(Some(&id)).is_ok());

        attribution.record(Some(id.clone()), "b");
        assert!(matches!(
            attribution.check_pull(Some(&id)),
            Err(BanditError::UniqueIdInUse(_))
        ));
        assert_eq!(attribution.resolve(Some(&id), None).unwrap(), "b");

        let mut last = None;
        attribution.settle(Some(&id), &mut last);
        assert!(matches!(
            attribution.resolve(Some(&id), None),
            Err(BanditError::UnknownUniqueId(_))
        ));
        assert!(attribution.check_pull(Some(&id)).is_ok());
    }

    #[test]
    fn restore_drops_orphans() {
        let mut attribution = Attribution::new(true);
        let restored = HashMap::from([
            (UniqueId::from("kept"), "b".to_owned()),
            (UniqueId::from("orphan"), "a".to_owned()),
        ]);
        attribution.restore(Some(restored), |arm| arm == "b");

        let pending = attribution.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[&UniqueId::from("kept")], "b");
    }

    #[test]
    fn unique_id_conversions() {
        assert_eq!(UniqueId::from(3u64), UniqueId::from("3"));
        assert_ne!(UniqueId::new_v4(), UniqueId::new_v4());
        assert_eq!(UniqueId::from("abc").to_string(), "abc");
    }
}
