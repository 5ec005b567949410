//! Bayesian multi-armed bandit agents.
//!
//! An [`AgentBuilder`] turns a template (named arm prototypes, a learner, a
//! policy and mode flags) into an [`AgentType`]; each instance of that type
//! owns copies of the arms, one learner per arm and a single random stream
//! shared by all of them.

pub mod actors;
pub mod agent;
pub mod arm;
pub mod config;
pub mod errors;
pub mod learner;
pub mod policies;
pub mod rng;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentBuilder, AgentState, AgentType, Modes, UniqueId};
pub use arm::{outcome, Arm, ArmLike, ArmState, Sample};
pub use config::AgentSettings;
pub use errors::{BanditError, LearnerError, PersistenceError};
pub use learner::Learner;
pub use policies::{policy_fn, Candidate, Policy, PolicyType};
pub use rng::SharedRng;
