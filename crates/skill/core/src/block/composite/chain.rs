use crate::block::{Block, BlockCategory, BlockRef, BlockStatus};
use crate::capability::World;
use crate::context::ExecutionContext;
use crate::error::ValidationResult;

use super::CompositeState;

/// Runs the inner block only if the previous entry succeeded.
///
/// Always a `Modifier`, so it can never open a sequence.
#[derive(Clone, Debug)]
pub struct ChainBlock {
    inner: BlockRef,
}

impl ChainBlock {
    pub const ID: &'static str = "chain";

    pub fn new(inner: BlockRef) -> Self {
        Self { inner }
    }
}

impl Block for ChainBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Modifier
    }

    fn can_execute(&self, ctx: &ExecutionContext, world: &dyn World) -> bool {
        self.inner.can_execute(ctx, world)
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let resumed = matches!(ctx.take_resume(), Some(CompositeState::Gate));
        if !resumed && ctx.previous_status() != Some(BlockStatus::Success) {
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
