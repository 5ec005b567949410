mod agent;

pub use agent::{AgentActor, Pull, Sample, Snapshot, Update};
