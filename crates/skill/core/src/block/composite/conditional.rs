use crate::block::{Block, BlockCategory, BlockRef, BlockStatus};
use crate::capability::World;
use crate::context::ExecutionContext;
use crate::error::ValidationResult;

use super::{CompositeState, Predicate};

/// Runs the inner block only when the predicate holds.
///
/// A false predicate yields `Failure` with no side effects. The predicate is
/// evaluated once: if the inner block defers, later ticks resume it without
/// re-checking.
#[derive(Clone, Debug)]
pub struct ConditionalBlock {
    inner: BlockRef,
    predicate: Predicate,
}

impl ConditionalBlock {
    pub const ID: &'static str = "conditional";

    pub fn new(inner: BlockRef, predicate: Predicate) -> Self {
        Self { inner, predicate }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Block for ConditionalBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        self.inner.category()
    }

    fn can_execute(&self, ctx: &ExecutionContext, world: &dyn World) -> bool {
        self.inner.can_execute(ctx, world)
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let gated = matches!(ctx.take_resume(), Some(CompositeState::Gate));
        if !gated && !self.predicate.evaluate(ctx, &*world) {
            return BlockStatus::Failure;
        }

        let status = ctx.nested(|ctx| self.inner.execute(ctx, world));
        if status == BlockStatus::InProgress {
            ctx.store_resume(CompositeState::Gate);
        }
        status
    }

    fn validate(&self) -> ValidationResult {
        self.inner.validate()
    }
}
