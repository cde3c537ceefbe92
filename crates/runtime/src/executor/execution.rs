//! One accepted cast in flight.

use std::sync::Arc;

use skill_core::{
    EntityId, ExecutionContext, ExecutionId, ResourceKind, RunState, SequenceRun, Skill,
    StepReport, World,
};

use super::InstanceId;
use crate::events::{CastInfo, FailureReason, InterruptCause};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Waiting for the instance's cast time to elapse.
    Casting,
    /// Walking the block sequence.
    Running,
}

/// How an execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Termination {
    Completed,
    Failed(FailureReason),
    Interrupted(InterruptCause),
}

impl Termination {
    /// Maps a finished run onto its lifecycle outcome; `None` while running.
    pub(crate) fn from_run(state: RunState) -> Option<Self> {
        match state {
            RunState::Running => None,
            RunState::Completed => Some(Self::Completed),
            RunState::Failed { index, block } => {
                Some(Self::Failed(FailureReason::BlockFailed { index, block }))
            }
            RunState::Interrupted { index } => {
                Some(Self::Interrupted(InterruptCause::Block { index }))
            }
            RunState::Invalid => Some(Self::Failed(FailureReason::InvalidSkill)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Execution {
    pub(crate) id: ExecutionId,
    pub(crate) instance: InstanceId,
    pub(crate) owner: EntityId,
    pub(crate) skill: Arc<Skill>,
    /// What was paid at cast start.
    pub(crate) cost: Option<(ResourceKind, f32)>,
    ctx: ExecutionContext,
    run: SequenceRun,
    phase: Phase,
    age: f32,
}

impl Execution {
    pub(crate) fn new(
        instance: InstanceId,
        skill: Arc<Skill>,
        cost: Option<(ResourceKind, f32)>,
        ctx: ExecutionContext,
        phase: Phase,
    ) -> Self {
        Self {
            id: ctx.id(),
            instance,
            owner: ctx.source(),
            skill,
            cost,
            ctx,
            run: SequenceRun::new(),
            phase,
            age: 0.0,
        }
    }

    pub(crate) fn info(&self) -> CastInfo {
        CastInfo {
            execution: self.id,
            instance: self.instance,
            skill: self.skill.id().to_owned(),
            owner: self.owner,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Interrupting during the cast phase refunds the cost.
    pub(crate) fn is_refundable(&self) -> bool {
        self.phase == Phase::Casting
    }

    pub(crate) fn begin_blocks(&mut self) {
        self.phase = Phase::Running;
    }

    pub(crate) fn age(&self) -> f32 {
        self.age
    }

    pub(crate) fn advance_age(&mut self, dt: f32) {
        self.age += dt;
    }

    pub(crate) fn step(&mut self, world: &mut dyn World, dt: f32) -> StepReport {
        self.run.step(&self.skill, &mut self.ctx, world, dt)
    }

    /// Stops the block sequence where it stands.
    pub(crate) fn abort(&mut self) {
        self.run.abort(&mut self.ctx);
    }

    pub(crate) fn context(&self) -> &ExecutionContext {
        &self.ctx
    }
}
