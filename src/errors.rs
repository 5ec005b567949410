use crate::agent::UniqueId;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LearnerError {
    #[error("Learner does not support decay")]
    DecayUnsupported,
    #[error("Learner has no random stream bound")]
    RngUnbound,
    #[error("Numerical failure in learner: {0}")]
    Numerical(String),
}

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("Learner is not set")]
    LearnerUnset,
    #[error("No arm has been pulled yet")]
    NoPriorPull,
    #[error("`unique_id` is required for a delayed-reward agent")]
    MissingUniqueId,
    #[error("`unique_id` is only accepted by a delayed-reward agent")]
    UniqueIdNotAccepted,
    #[error("Unique id {0} does not match any pending pull")]
    UnknownUniqueId(UniqueId),
    #[error("Unique id {0} is still pending")]
    UniqueIdInUse(UniqueId),
    #[error("Context must be provided for a contextual agent")]
    ContextRequired,
    #[error("Context must be omitted for a non-contextual agent")]
    ContextForbidden,
    #[error("An agent must have at least one arm")]
    NoArms,
    #[error("Arm {0} is declared more than once")]
    DuplicateArm(String),
    #[error("Arm {0} is an agent that needs a context or a unique id to be pulled")]
    NotNestable(String),
    #[error("Arm {0} not found")]
    ArmNotFound(String),
    #[error("Policy chose arm index {0}, which does not exist")]
    InvalidChoice(usize),
    #[error("Context has {rows} rows but {outcomes} outcomes were given")]
    ShapeMismatch { rows: usize, outcomes: usize },
    #[error(transparent)]
    Learner(#[from] LearnerError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to (de)serialize agent state as JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
