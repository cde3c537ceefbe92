//! Stepping a skill's block sequence across ticks.

use crate::block::BlockStatus;
use crate::capability::World;
use crate::context::ExecutionContext;
use crate::skill::Skill;

/// Where a sequence run stands after a step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    /// More work remains; step again next tick.
    Running,
    /// Every entry finished (or was skipped).
    Completed,
    /// A non-optional entry failed and the rest were abandoned.
    Failed { index: usize, block: String },
    /// An entry reported `Interrupted`, or the run was aborted.
    Interrupted { index: usize },
    /// The skill never passed validation; nothing ran.
    Invalid,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Why an entry was passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// `can_execute` returned false.
    PreconditionFailed,
    /// The entry failed but is marked optional.
    OptionalFailure,
}

/// An entry that did not contribute to the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    pub index: usize,
    pub block: String,
    pub reason: SkipReason,
}

/// Result of one [`SequenceRun::step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub state: RunState,
    /// Entries skipped during this step, for the caller to log.
    pub skipped: Vec<SkippedEntry>,
}

/// Cursor over a skill's entries.
///
/// Holds no reference to the skill so the caller can keep the skill, the
/// context and the run side by side.
#[derive(Clone, Debug, Default)]
pub struct SequenceRun {
    cursor: usize,
    waited: f32,
    in_progress: bool,
    finished: Option<RunState>,
}

impl SequenceRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the entry that runs next.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// True once the first entry has started executing.
    pub fn has_started(&self) -> bool {
        self.cursor > 0 || self.in_progress
    }

    /// Advances the run with `dt` seconds of budget.
    ///
    /// Per entry, in order: wait out its delay, prune dead targets, check
    /// `can_execute` (unless resuming deferred work), execute, record the
    /// status as the context's previous status. Runs as many entries as the
    /// budget allows; stops at the first `InProgress`. Each block sees only
    /// the budget its entry has left as the context's delta time.
    pub fn step(
        &mut self,
        skill: &Skill,
        ctx: &mut ExecutionContext,
        world: &mut dyn World,
        dt: f32,
    ) -> StepReport {
        let mut skipped = Vec::new();
        let state = self.advance(skill, ctx, world, dt, &mut skipped);
        if !state.is_running() {
            self.finished = Some(state.clone());
        }
        StepReport { state, skipped }
    }

    fn advance(
        &mut self,
        skill: &Skill,
        ctx: &mut ExecutionContext,
        world: &mut dyn World,
        dt: f32,
        skipped: &mut Vec<SkippedEntry>,
    ) -> RunState {
        if let Some(state) = &self.finished {
            return state.clone();
        }
        if !skill.is_validated() {
            return RunState::Invalid;
        }

        let mut budget = dt.max(0.0);

        while let Some(entry) = skill.entries().get(self.cursor) {
            let index = self.cursor;

            if !self.in_progress && self.waited < entry.delay {
                let needed = entry.delay - self.waited;
                if budget < needed {
                    self.waited += budget;
                    return RunState::Running;
                }
                budget -= needed;
                self.waited = entry.delay;
            }

            ctx.set_current_entry(index);
            ctx.set_delta_time(budget);
            ctx.prune_targets(&*world);

            if !self.in_progress && !entry.block.can_execute(ctx, &*world) {
                skipped.push(SkippedEntry {
                    index,
                    block: entry.block.id().to_owned(),
                    reason: SkipReason::PreconditionFailed,
                });
                ctx.set_previous_status(Some(BlockStatus::Failure));
                self.next_entry();
                continue;
            }

            let status = entry.block.execute(ctx, world);
            match status {
                BlockStatus::InProgress => {
                    self.in_progress = true;
                    return RunState::Running;
                }
                BlockStatus::Success => {}
                BlockStatus::Failure if entry.optional => {
                    skipped.push(SkippedEntry {
                        index,
                        block: entry.block.id().to_owned(),
                        reason: SkipReason::OptionalFailure,
                    });
                }
                BlockStatus::Failure => {
                    ctx.set_previous_status(Some(status));
                    return RunState::Failed {
                        index,
                        block: entry.block.id().to_owned(),
                    };
                }
                BlockStatus::Interrupted => {
                    ctx.set_previous_status(Some(status));
                    ctx.clear_resume();
                    return RunState::Interrupted { index };
                }
            }

            if self.in_progress {
                // deferred work consumed this tick's budget
                budget = 0.0;
            }
            ctx.set_previous_status(Some(status));
            self.next_entry();
        }

        RunState::Completed
    }

    fn next_entry(&mut self) {
        self.cursor += 1;
        self.waited = 0.0;
        self.in_progress = false;
    }

    /// Stops the run where it stands and drops any deferred composite work.
    pub fn abort(&mut self, ctx: &mut ExecutionContext) -> RunState {
        ctx.clear_resume();
        let state = match &self.finished {
            Some(state) => state.clone(),
            None => RunState::Interrupted { index: self.cursor },
        };
        self.finished = Some(state.clone());
        state
    }
}
