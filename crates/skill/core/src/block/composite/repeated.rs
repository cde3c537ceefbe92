use crate::block::{Block, BlockCategory, BlockRef, BlockStatus};
use crate::capability::World;
use crate::config::SkillConfig;
use crate::context::ExecutionContext;
use crate::error::{ConfigError, ValidationResult};

use super::CompositeState;

/// Runs the inner block `count` times, `interval` seconds apart.
///
/// The first repetition runs immediately. Between repetitions the block yields
/// `InProgress`; time left over from a long tick carries into the next wait,
/// so a zero interval runs every repetition in one call. An inner `Failure` or
/// `Interrupted` ends the repetition with that status.
#[derive(Clone, Debug)]
pub struct RepeatedBlock {
    inner: BlockRef,
    count: u32,
    interval: f32,
}

impl RepeatedBlock {
    pub const ID: &'static str = "repeated";

    pub fn new(inner: BlockRef, count: u32, interval: f32) -> Self {
        Self {
            inner,
            count,
            interval,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Block for RepeatedBlock {
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
        let (mut completed, mut wait, mut inner_pending) = match ctx.take_resume() {
            Some(CompositeState::Repeat {
                completed,
                inner_pending: true,
                ..
            }) => (completed, 0.0, true),
            Some(CompositeState::Repeat { completed, wait, .. }) => {
                (completed, wait - ctx.delta_time(), false)
            }
            // a negative wait is time already spent in this tick
            _ => (0, -ctx.delta_time(), false),
        };

        loop {
            if wait > 0.0 {
                ctx.store_resume(CompositeState::Repeat {
                    completed,
                    wait,
                    inner_pending: false,
                });
                return BlockStatus::InProgress;
            }

            let status = if inner_pending {
                inner_pending = false;
                ctx.nested(|ctx| self.inner.execute(ctx, &mut *world))
            } else {
                // a fresh repetition only has the overshoot of its wait left
                ctx.with_delta_time(-wait, |ctx| {
                    ctx.nested(|ctx| self.inner.execute(ctx, &mut *world))
                })
            };
            match status {
                BlockStatus::Success => {
                    completed += 1;
                    if completed >= self.count {
                        return BlockStatus::Success;
                    }
                    wait += self.interval;
                }
                BlockStatus::InProgress => {
                    ctx.store_resume(CompositeState::Repeat {
                        completed,
                        wait: 0.0,
                        inner_pending: true,
                    });
                    return BlockStatus::InProgress;
                }
                status => return status,
            }
        }
    }

    fn validate(&self) -> ValidationResult {
        if self.count == 0 || self.count > SkillConfig::MAX_REPETITIONS {
            return Err(ConfigError::invalid(
                Self::ID,
                "count",
                format!("must be within 1..={}", SkillConfig::MAX_REPETITIONS),
            ));
        }
        if self.interval < 0.0 {
            return Err(ConfigError::negative(Self::ID, "interval", self.interval));
        }
        self.inner.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::testing::{Stub, scripted_context};

    #[test]
    fn zero_interval_runs_all_at_once() {
        let stub = Stub::success();
        let block = RepeatedBlock::new(stub.block(), 3, 0.0);
        let (mut world, mut ctx) = scripted_context();

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Success);
        assert_eq!(stub.calls(), 3);
    }

    #[test]
    fn spaced_repetitions_yield_between_runs() {
        let stub = Stub::success();
        let block = RepeatedBlock::new(stub.block(), 3, 0.5);
        let (mut world, mut ctx) = scripted_context();

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        assert_eq!(stub.calls(), 1);

        ctx.set_delta_time(0.25);
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        assert_eq!(stub.calls(), 1);

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        assert_eq!(stub.calls(), 2);

        // a long tick covers the last wait
        ctx.set_delta_time(2.0);
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Success);
        assert_eq!(stub.calls(), 3);
    }

    #[test]
    fn mid_tick_start_counts_the_rest_of_the_tick() {
        let stub = Stub::success();
        let block = RepeatedBlock::new(stub.block(), 3, 0.5);
        let (mut world, mut ctx) = scripted_context();

        // started with 0.25s of the tick left: the next run is due 0.25s later
        ctx.set_delta_time(0.25);
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        ctx.set_delta_time(0.25);
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        assert_eq!(stub.calls(), 2);
    }

    #[test]
    fn inner_failure_stops_repetition() {
        let stub = Stub::failure();
        let block = RepeatedBlock::new(stub.block(), 5, 0.0);
        let (mut world, mut ctx) = scripted_context();

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Failure);
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn zero_count_is_invalid() {
        let block = RepeatedBlock::new(Stub::success().block(), 0, 1.0);
        assert!(block.validate().is_err());
    }
}
