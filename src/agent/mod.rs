mod agent;
mod builder;
mod modes;
mod state;

pub use agent::Agent;
pub use builder::{AgentBuilder, AgentType};
pub use modes::{Modes, UniqueId};
pub use state::AgentState;
