pub mod epsilon_greedy;
mod policy;
pub mod thompson_sampling;
pub mod ucb;

pub use policy::{policy_fn, Candidate, Policy, PolicyType};
