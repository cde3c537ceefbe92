use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::World;
use crate::context::{ExecutionContext, keys};
use crate::error::{ConfigError, ValidationResult};
use crate::skill::LevelScaled;

/// Applies a named, timed status to every target that accepts statuses.
///
/// Fails when no target accepted it (no receiver, or all immune).
#[derive(Clone, Debug, PartialEq)]
pub struct StatusBlock {
    name: String,
    duration: LevelScaled,
}

impl StatusBlock {
    pub const ID: &'static str = "status";

    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: LevelScaled::fixed(duration),
        }
    }

    /// Additional seconds per level above the first.
    pub fn scaling(mut self, per_level: f32) -> Self {
        self.duration.per_level = per_level;
        self
    }

    pub fn status_name(&self) -> &str {
        &self.name
    }
}

impl Block for StatusBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Effect
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let duration = self.duration.at(ctx.level());
        let mut applied = 0i64;
        for &target in ctx.targets() {
            if let Some(receiver) = world.status_receiver(target) {
                if receiver.apply_status(&self.name, duration) {
                    applied += 1;
                }
            }
        }

        ctx.set(keys::STATUS_APPLIED, applied);
        if applied == 0 {
            BlockStatus::Failure
        } else {
            BlockStatus::Success
        }
    }

    fn validate(&self) -> ValidationResult {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid(Self::ID, "name", "must not be empty"));
        }
        if self.duration.base < 0.0 {
            return Err(ConfigError::negative(Self::ID, "duration", self.duration.base));
        }
        Ok(())
    }
}
