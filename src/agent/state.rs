use super::modes::UniqueId;

use crate::rng::SharedRng;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Everything an agent instance persists. The template (prototypes, learner,
/// policy and modes) is not part of it: it is supplied again on restore.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentState<S> {
    pub rng: SharedRng,
    pub arms: BTreeMap<String, S>,
    #[serde(default)]
    pub pending: Option<HashMap<UniqueId, String>>,
}
