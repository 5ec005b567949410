use crate::agent::{Agent, AgentState, UniqueId};
use crate::arm::ArmState;
use crate::errors::BanditError;

use actix::prelude::*;
use ndarray::{Array1, Array2};
use tracing::info;

/// Owns one agent and handles its messages one at a time, so callers on
/// several tasks can share an instance without locking it themselves.
pub struct AgentActor {
    agent: Agent,
}

impl AgentActor {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Actor for AgentActor {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!(arms = self.agent.arms().len(), "Starting agent actor");
    }
}

// Messages
#[derive(Message)]
#[rtype(result = "Result<String, BanditError>")]
pub struct Pull {
    pub context: Option<Array2<f64>>,
    pub unique_id: Option<UniqueId>,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<f64>, BanditError>")]
pub struct Sample {
    pub context: Option<Array2<f64>>,
    pub size: usize,
}

#[derive(Message)]
#[rtype(result = "Result<(), BanditError>")]
pub struct Update {
    pub context: Option<Array2<f64>>,
    pub outcome: Array1<f64>,
    pub unique_id: Option<UniqueId>,
}

#[derive(Message)]
#[rtype(result = "AgentState<ArmState>")]
pub struct Snapshot;

// Handlers
impl Handler<Pull> for AgentActor {
    type Result = Result<String, BanditError>;

    fn handle(&mut self, msg: Pull, _: &mut Self::Context) -> Self::Result {
        self.agent
            .pull(msg.context.as_ref().map(Array2::view), msg.unique_id)?;
        self.agent
            .last_arm_pulled()
            .map(str::to_owned)
            .ok_or(BanditError::NoPriorPull)
    }
}

impl Handler<Sample> for AgentActor {
    type Result = Result<Vec<f64>, BanditError>;

    fn handle(&mut self, msg: Sample, _: &mut Self::Context) -> Self::Result {
        self.agent
            .sample(msg.context.as_ref().map(Array2::view), msg.size)
    }
}

impl Handler<Update> for AgentActor {
    type Result = Result<(), BanditError>;

    fn handle(&mut self, msg: Update, _: &mut Self::Context) -> Self::Result {
        self.agent.update(
            msg.context.as_ref().map(Array2::view),
            msg.outcome.view(),
            msg.unique_id,
        )
    }
}

impl Handler<Snapshot> for AgentActor {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _: Snapshot, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.agent.snapshot())
    }
}
