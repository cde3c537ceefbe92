//! Fluent builder for [`Skill`].

use crate::block::{BlockRef, BlockRegistry, BlockSpec};
use crate::capability::ResourceKind;
use crate::config::SkillConfig;
use crate::error::ConfigError;
use crate::skill::{BlockEntry, GrammarValidator, LevelScaled, Skill, SkillCost, SkillKind};
use crate::targeting::TargetResolver;

#[derive(Clone, Debug)]
enum BlockSource {
    Spec(BlockSpec),
    Built(BlockRef),
}

#[derive(Clone, Debug)]
struct EntryDescriptor {
    source: BlockSource,
    order: Option<i32>,
    delay: f32,
    optional: bool,
}

/// Accumulates block descriptors and metadata; produces a [`Skill`] only
/// through [`build`](Self::build).
///
/// Entry modifiers (`optional`, `delay`, `order`) apply to the most recently
/// added block and are ignored before the first one.
///
/// ```ignore
/// let skill = SkillBuilder::new("fireball")
///     .name("Fireball")
///     .block(BlockSpec::new("damage").with("amount", 40.0).with("kind", "fire"))
///     .block(BlockSpec::new("status").with("name", "burning").with("duration", 3.0))
///     .optional()
///     .targeting(TargetResolver::radius(4.0, SideMask::ENEMIES))
///     .cooldown(6.0)
///     .cast_time(1.0)
///     .build(&registry)?;
/// ```
#[derive(Clone, Debug)]
pub struct SkillBuilder {
    id: String,
    name: Option<String>,
    kind: SkillKind,
    entries: Vec<EntryDescriptor>,
    resolver: TargetResolver,
    cooldown: LevelScaled,
    cast_time: LevelScaled,
    cost: Option<SkillCost>,
    range: Option<f32>,
    required_level: u32,
}

impl SkillBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: SkillKind::Active,
            entries: Vec::new(),
            resolver: TargetResolver::default(),
            cooldown: LevelScaled::ZERO,
            cast_time: LevelScaled::ZERO,
            cost: None,
            range: None,
            required_level: SkillConfig::MIN_LEVEL,
        }
    }

    /// Display name; defaults to the id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: SkillKind) -> Self {
        self.kind = kind;
        self
    }

    /// Appends a block built from the registry at `build` time.
    pub fn block(self, spec: BlockSpec) -> Self {
        self.push(BlockSource::Spec(spec))
    }

    /// Appends an already constructed block.
    pub fn block_ref(self, block: BlockRef) -> Self {
        self.push(BlockSource::Built(block))
    }

    fn push(mut self, source: BlockSource) -> Self {
        self.entries.push(EntryDescriptor {
            source,
            order: None,
            delay: 0.0,
            optional: false,
        });
        self
    }

    /// Marks the last block optional: its failure is skipped, not fatal.
    pub fn optional(mut self) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.optional = true;
        }
        self
    }

    /// Delays the last block by `seconds` after the previous one finished.
    pub fn delay(mut self, seconds: f32) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.delay = seconds;
        }
        self
    }

    /// Overrides the sort key of the last block (defaults to its position).
    pub fn order(mut self, order: i32) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.order = Some(order);
        }
        self
    }

    pub fn targeting(mut self, resolver: TargetResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn cooldown(mut self, cooldown: impl Into<LevelScaled>) -> Self {
        self.cooldown = cooldown.into();
        self
    }

    pub fn cast_time(mut self, cast_time: impl Into<LevelScaled>) -> Self {
        self.cast_time = cast_time.into();
        self
    }

    pub fn cost(mut self, resource: ResourceKind, amount: impl Into<LevelScaled>) -> Self {
        self.cost = Some(SkillCost::new(resource, amount));
        self
    }

    pub fn range(mut self, range: f32) -> Self {
        self.range = Some(range);
        self
    }

    pub fn required_level(mut self, level: u32) -> Self {
        self.required_level = level;
        self
    }

    /// Instantiates every block, validates blocks, metadata and grammar, and
    /// returns the validated skill.
    ///
    /// # Errors
    ///
    /// The first problem found, in that order.
    pub fn build(self, registry: &BlockRegistry) -> Result<Skill, ConfigError> {
        self.check_metadata()?;

        let mut entries = Vec::with_capacity(self.entries.len());
        for (position, descriptor) in self.entries.into_iter().enumerate() {
            let block = match descriptor.source {
                BlockSource::Spec(spec) => registry.build(&spec)?,
                BlockSource::Built(block) => {
                    block.validate()?;
                    block
                }
            };
            if descriptor.delay < 0.0 {
                return Err(ConfigError::negative(self.id.clone(), "delay", descriptor.delay));
            }
            entries.push(BlockEntry {
                block,
                order: descriptor.order.unwrap_or(position as i32),
                delay: descriptor.delay,
                optional: descriptor.optional,
            });
        }
        entries.sort_by_key(|entry| entry.order);

        let mut skill = Skill {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            kind: self.kind,
            entries,
            resolver: self.resolver,
            cooldown: self.cooldown,
            cast_time: self.cast_time,
            cost: self.cost,
            range: self.range,
            required_level: self.required_level,
            validated: false,
        };
        GrammarValidator::validate(&skill)?;
        skill.validated = true;
        Ok(skill)
    }

    fn check_metadata(&self) -> Result<(), ConfigError> {
        let scaled = [
            ("cooldown", self.cooldown),
            ("cast_time", self.cast_time),
            ("cost", self.cost.map(|c| c.amount).unwrap_or_default()),
        ];
        for (field, value) in scaled {
            if value.base < 0.0 {
                return Err(ConfigError::negative(self.id.clone(), field, value.base));
            }
        }
        if let Some(range) = self.range {
            if range < 0.0 || range.is_nan() {
                return Err(ConfigError::negative(self.id.clone(), "range", range));
            }
        }
        if !(SkillConfig::MIN_LEVEL..=SkillConfig::MAX_LEVEL).contains(&self.required_level) {
            return Err(ConfigError::invalid(
                self.id.clone(),
                "required_level",
                format!(
                    "must be within {}..={}",
                    SkillConfig::MIN_LEVEL,
                    SkillConfig::MAX_LEVEL
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::testing::Stub;
    use crate::block::{BlockCategory, BlockStatus};

    fn registry() -> BlockRegistry {
        BlockRegistry::with_builtins()
    }

    fn damage(amount: f32) -> BlockSpec {
        BlockSpec::new("damage").with("amount", amount)
    }

    #[test]
    fn built_skill_is_validated() {
        let skill = SkillBuilder::new("strike")
            .block(damage(5.0))
            .cooldown(LevelScaled::new(3.0, -0.5))
            .build(&registry())
            .expect("valid skill");

        assert!(skill.is_validated());
        assert_eq!(skill.name(), "strike");
        assert_eq!(skill.cooldown().at(3), 2.0);
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn grammar_violation_names_the_offender() {
        let err = SkillBuilder::new("bad")
            .block(damage(5.0))
            .block_ref(Stub::new(BlockStatus::Success, BlockCategory::Target).block())
            .block_ref(Stub::new(BlockStatus::Success, BlockCategory::Target).block())
            .build(&registry())
            .unwrap_err();

        let violation = err.violation().copied().expect("grammar error");
        assert_eq!(violation.index, 2);
        assert_eq!(violation.previous, Some(BlockCategory::Target));
    }

    #[test]
    fn empty_skill_is_rejected() {
        assert_eq!(
            SkillBuilder::new("empty").build(&registry()).unwrap_err(),
            ConfigError::EmptySequence {
                skill: "empty".into()
            }
        );
    }

    #[test]
    fn negative_metadata_is_rejected() {
        let err = SkillBuilder::new("neg")
            .block(damage(1.0))
            .cooldown(-1.0)
            .build(&registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeValue { field: "cooldown", .. }));

        let err = SkillBuilder::new("neg")
            .block(damage(1.0))
            .delay(-0.5)
            .build(&registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeValue { field: "delay", .. }));
    }

    #[test]
    fn order_sorts_stably() {
        let first: BlockRef = Arc::new(crate::block::DamageBlock::new(1.0));
        let second: BlockRef = Arc::new(crate::block::HealBlock::new(1.0));
        let third: BlockRef = Arc::new(crate::block::DamageBlock::new(3.0));
        let skill = SkillBuilder::new("sorted")
            .block_ref(Arc::clone(&third))
            .order(5)
            .block_ref(Arc::clone(&first))
            .order(1)
            .block_ref(Arc::clone(&second))
            .order(1)
            .build(&registry())
            .expect("valid skill");

        let ids: Vec<&str> = skill.entries().iter().map(|e| e.block.id()).collect();
        assert_eq!(ids, vec!["damage", "heal", "damage"]);
        assert!(Arc::ptr_eq(&skill.entries()[0].block, &first));
    }

    #[test]
    fn block_errors_surface_from_build() {
        let err = SkillBuilder::new("broken")
            .block(BlockSpec::new("heal"))
            .build(&registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingParameter { .. }));
    }
}
