//! Leaf blocks: the only blocks that mutate the world.

mod damage;
mod heal;
mod set_variable;
mod status;
mod teleport;

pub use damage::DamageBlock;
pub use heal::HealBlock;
pub use set_variable::SetVariableBlock;
pub use status::StatusBlock;
pub use teleport::{TeleportBlock, TeleportMode};

use crate::config::SkillConfig;
use crate::context::ExecutionContext;
use crate::error::{ConfigError, ValidationResult};

/// Critical roll parameters shared by damage and heal blocks.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CritRoll {
    /// Probability in `[0, 1]`.
    pub chance: f32,
    pub multiplier: f32,
}

impl CritRoll {
    pub fn new(chance: f32) -> Self {
        Self {
            chance,
            multiplier: SkillConfig::DEFAULT_CRIT_MULTIPLIER,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    fn validate(&self, owner: &str) -> ValidationResult {
        if !(0.0..=1.0).contains(&self.chance) {
            return Err(ConfigError::invalid(
                owner,
                "crit_chance",
                format!("{} is not a probability", self.chance),
            ));
        }
        if self.multiplier < 1.0 {
            return Err(ConfigError::invalid(
                owner,
                "crit_multiplier",
                format!("{} would reduce a critical hit", self.multiplier),
            ));
        }
        Ok(())
    }
}

/// Rolls the final output of a damage or heal block.
///
/// Order: crit, then jitter, then the context multiplier. Draws from the
/// context RNG only for the rolls that are enabled, so disabling both makes the
/// output exact.
fn roll_output(
    ctx: &mut ExecutionContext,
    magnitude: f32,
    crit: Option<CritRoll>,
    jitter: bool,
    multiplier_key: &str,
) -> (f32, bool) {
    let mut output = magnitude;

    let critical = match crit {
        Some(roll) => ctx.rng().chance(roll.chance),
        None => false,
    };
    if let (true, Some(roll)) = (critical, crit) {
        output *= roll.multiplier;
    }

    if jitter {
        let spread = SkillConfig::OUTPUT_JITTER;
        output *= ctx.rng().range_f32(1.0 - spread, 1.0 + spread);
    }

    output *= ctx.get(multiplier_key, 1.0f32);
    (output.max(0.0), critical)
}
