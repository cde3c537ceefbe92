//! Event payloads.

use serde::{Deserialize, Serialize};
use skill_core::{EntityId, ExecutionId};

use super::Topic;
use crate::executor::InstanceId;

/// Identity of the execution an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastInfo {
    pub execution: ExecutionId,
    pub instance: InstanceId,
    pub skill: String,
    pub owner: EntityId,
}

/// Why an execution ended in failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A non-optional block returned Failure.
    BlockFailed { index: usize, block: String },
    /// The execution outlived the safety timeout.
    Timeout,
    /// The owner left the world mid-execution.
    OwnerDestroyed,
    /// The skill lost its validated marker.
    InvalidSkill,
}

/// Who stopped an interrupted execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterruptCause {
    /// `interrupt_skill` was called for the instance.
    Requested,
    /// `stop_all_skills` was called.
    Stopped,
    /// The instance was removed from the executor.
    Removed,
    /// The instance's cast was reset or interrupted directly, outside the
    /// executor.
    Cancelled,
    /// A block returned Interrupted.
    Block { index: usize },
}

/// Lifecycle notification published by the executor.
///
/// Every accepted cast publishes exactly one `Started` followed by exactly
/// one of `Completed`, `Failed` or `Interrupted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SkillEvent {
    Started {
        cast: CastInfo,
        targets: Vec<EntityId>,
        /// False for instant casts, which run their blocks immediately.
        casting: bool,
    },
    Completed {
        cast: CastInfo,
    },
    Failed {
        cast: CastInfo,
        reason: FailureReason,
    },
    Interrupted {
        cast: CastInfo,
        cause: InterruptCause,
        /// The cost was paid back because no block had run yet.
        refunded: bool,
    },
    CooldownFinished {
        instance: InstanceId,
        skill: String,
        owner: EntityId,
    },
}

impl SkillEvent {
    pub fn topic(&self) -> Topic {
        match self {
            SkillEvent::CooldownFinished { .. } => Topic::Cooldown,
            _ => Topic::Lifecycle,
        }
    }

    /// The execution this event belongs to; `None` for cooldown events.
    pub fn cast(&self) -> Option<&CastInfo> {
        match self {
            SkillEvent::Started { cast, .. }
            | SkillEvent::Completed { cast }
            | SkillEvent::Failed { cast, .. }
            | SkillEvent::Interrupted { cast, .. } => Some(cast),
            SkillEvent::CooldownFinished { .. } => None,
        }
    }

    pub fn instance(&self) -> InstanceId {
        match self {
            SkillEvent::Started { cast, .. }
            | SkillEvent::Completed { cast }
            | SkillEvent::Failed { cast, .. }
            | SkillEvent::Interrupted { cast, .. } => cast.instance,
            SkillEvent::CooldownFinished { instance, .. } => *instance,
        }
    }

    /// True for the single closing event of an execution.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SkillEvent::Completed { .. }
                | SkillEvent::Failed { .. }
                | SkillEvent::Interrupted { .. }
        )
    }

    /// Short lowercase label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            SkillEvent::Started { .. } => "started",
            SkillEvent::Completed { .. } => "completed",
            SkillEvent::Failed { .. } => "failed",
            SkillEvent::Interrupted { .. } => "interrupted",
            SkillEvent::CooldownFinished { .. } => "cooldown_finished",
        }
    }
}
