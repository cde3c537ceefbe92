//! Immutable skill definitions.
//!
//! A [`Skill`] is an ordered list of block entries plus the metadata a cast
//! needs (targeting, cooldown, cast time, cost, range). Skills are only
//! produced by [`SkillBuilder::build`], which validates every block and the
//! block grammar; the executor refuses anything else.

mod builder;
mod grammar;
mod sequence;

pub use builder::SkillBuilder;
pub use grammar::{GrammarRule, GrammarValidator};
pub use sequence::{RunState, SequenceRun, SkipReason, SkippedEntry, StepReport};

use crate::block::{BlockCategory, BlockRef};
use crate::capability::ResourceKind;
use crate::config::SkillConfig;
use crate::error::{ConfigError, ValidationResult};
use crate::targeting::TargetResolver;

/// How a skill is used.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillKind {
    /// Cast on demand.
    #[default]
    Active,
    /// Always on; never cast.
    Passive,
    /// Cast to flip an on/off state.
    Toggle,
}

/// A value that grows linearly with level: `base + per_level * (level - 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelScaled {
    pub base: f32,
    pub per_level: f32,
}

impl LevelScaled {
    pub const ZERO: Self = Self::fixed(0.0);

    pub const fn new(base: f32, per_level: f32) -> Self {
        Self { base, per_level }
    }

    pub const fn fixed(base: f32) -> Self {
        Self::new(base, 0.0)
    }

    /// Value at `level`, never negative. Level 0 is treated as level 1.
    pub fn at(&self, level: u32) -> f32 {
        let steps = level.max(SkillConfig::MIN_LEVEL) - SkillConfig::MIN_LEVEL;
        (self.base + self.per_level * steps as f32).max(0.0)
    }
}

impl From<f32> for LevelScaled {
    fn from(base: f32) -> Self {
        Self::fixed(base)
    }
}

/// Resource paid when a cast starts.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillCost {
    pub resource: ResourceKind,
    pub amount: LevelScaled,
}

impl SkillCost {
    pub fn new(resource: ResourceKind, amount: impl Into<LevelScaled>) -> Self {
        Self {
            resource,
            amount: amount.into(),
        }
    }
}

/// One position in a skill's block sequence.
#[derive(Clone, Debug)]
pub struct BlockEntry {
    pub block: BlockRef,
    /// Sort key; entries with equal keys keep their insertion order.
    pub order: i32,
    /// Seconds to wait before this entry runs.
    pub delay: f32,
    /// A failure of this entry is logged and skipped instead of aborting.
    pub optional: bool,
}

/// A validated, immutable skill definition.
#[derive(Clone, Debug)]
pub struct Skill {
    id: String,
    name: String,
    kind: SkillKind,
    entries: Vec<BlockEntry>,
    resolver: TargetResolver,
    cooldown: LevelScaled,
    cast_time: LevelScaled,
    cost: Option<SkillCost>,
    range: Option<f32>,
    required_level: u32,
    validated: bool,
}

impl Skill {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SkillKind {
        self.kind
    }

    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    pub fn resolver(&self) -> &TargetResolver {
        &self.resolver
    }

    pub fn cooldown(&self) -> LevelScaled {
        self.cooldown
    }

    pub fn cast_time(&self) -> LevelScaled {
        self.cast_time
    }

    pub fn cost(&self) -> Option<SkillCost> {
        self.cost
    }

    /// Maximum distance to an explicit target, if limited.
    pub fn range(&self) -> Option<f32> {
        self.range
    }

    pub fn required_level(&self) -> u32 {
        self.required_level
    }

    /// True only for skills produced by a successful [`SkillBuilder::build`].
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Block categories in execution order.
    pub fn categories(&self) -> Vec<BlockCategory> {
        self.entries.iter().map(|e| e.block.category()).collect()
    }

    /// Re-runs every check the builder performs.
    pub fn validate(&self) -> ValidationResult {
        for entry in &self.entries {
            entry.block.validate()?;
        }
        GrammarValidator::validate(self)
    }

    /// Fails unless the skill carries the validated marker.
    pub fn ensure_validated(&self) -> ValidationResult {
        if self.validated {
            Ok(())
        } else {
            Err(ConfigError::NotValidated {
                skill: self.id.clone(),
            })
        }
    }
}
