use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::World;
use crate::context::{ExecutionContext, Value};
use crate::error::{ConfigError, ValidationResult};

/// Writes a constant into the context so later blocks can read it.
///
/// Typical use is tuning the next effect, e.g. `damage.multiplier = 1.5`.
#[derive(Clone, Debug, PartialEq)]
pub struct SetVariableBlock {
    key: String,
    value: Value,
}

impl SetVariableBlock {
    pub const ID: &'static str = "set_variable";

    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Block for SetVariableBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Modifier
    }

    fn execute(&self, ctx: &mut ExecutionContext, _world: &mut dyn World) -> BlockStatus {
        ctx.set(self.key.clone(), self.value.clone());
        BlockStatus::Success
    }

    fn validate(&self) -> ValidationResult {
        if self.key.is_empty() {
            return Err(ConfigError::invalid(Self::ID, "key", "must not be empty"));
        }
        Ok(())
    }
}
