use crate::block::{Block, BlockCategory, BlockRef, BlockStatus};
use crate::capability::World;
use crate::context::ExecutionContext;
use crate::error::{ConfigError, ValidationResult};

use super::CompositeState;

/// Waits `delay` seconds, yielding `InProgress`, then delegates.
#[derive(Clone, Debug)]
pub struct DelayedBlock {
    inner: BlockRef,
    delay: f32,
}

impl DelayedBlock {
    pub const ID: &'static str = "delayed";

    pub fn new(inner: BlockRef, delay: f32) -> Self {
        Self { inner, delay }
    }
}

impl Block for DelayedBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        self.inner.category()
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let (elapsed, inner_started) = match ctx.take_resume() {
            Some(CompositeState::Delay { elapsed }) => {
                (elapsed + ctx.delta_time(), elapsed >= self.delay)
            }
            // starting partway through a tick: the rest of it already counts
            _ => (ctx.delta_time(), false),
        };
        if elapsed < self.delay {
            ctx.store_resume(CompositeState::Delay { elapsed });
            return BlockStatus::InProgress;
        }

        let status = if inner_started {
            ctx.nested(|ctx| self.inner.execute(ctx, world))
        } else {
            let left = elapsed - self.delay;
            ctx.with_delta_time(left, |ctx| ctx.nested(|ctx| self.inner.execute(ctx, world)))
        };
        if status == BlockStatus::InProgress {
            ctx.store_resume(CompositeState::Delay { elapsed });
        }
        status
    }

    fn validate(&self) -> ValidationResult {
        if self.delay < 0.0 {
            return Err(ConfigError::negative(Self::ID, "delay", self.delay));
        }
        self.inner.validate()
    }
}
