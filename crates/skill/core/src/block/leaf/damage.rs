use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::{DamageKind, World};
use crate::context::{ExecutionContext, keys};
use crate::error::{ConfigError, ValidationResult};
use crate::skill::LevelScaled;

use super::{CritRoll, roll_output};

/// Deals level-scaled damage to every target with a health pool.
///
/// Each target receives `(1 - resistance(kind)) * output`; the crit and jitter
/// rolls happen once per execution, not per target. Writes
/// [`keys::DAMAGE_TOTAL`] and [`keys::DAMAGE_CRITICAL`].
#[derive(Clone, Debug, PartialEq)]
pub struct DamageBlock {
    amount: LevelScaled,
    kind: DamageKind,
    crit: Option<CritRoll>,
    jitter: bool,
}

impl DamageBlock {
    pub const ID: &'static str = "damage";

    pub fn new(base: f32) -> Self {
        Self {
            amount: LevelScaled::fixed(base),
            kind: DamageKind::default(),
            crit: None,
            jitter: false,
        }
    }

    /// Additional damage per level above the first.
    pub fn scaling(mut self, per_level: f32) -> Self {
        self.amount.per_level = per_level;
        self
    }

    pub fn kind(mut self, kind: DamageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn crit(mut self, crit: CritRoll) -> Self {
        self.crit = Some(crit);
        self
    }

    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    pub fn damage_kind(&self) -> DamageKind {
        self.kind
    }
}

impl Block for DamageBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Effect
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let magnitude = self.amount.at(ctx.level());
        let (output, critical) =
            roll_output(ctx, magnitude, self.crit, self.jitter, keys::DAMAGE_MULTIPLIER);

        let mut total = 0.0f32;
        let mut hit = false;
        for &target in ctx.targets() {
            let resistance = world.resistance(target, self.kind);
            if let Some(health) = world.damageable_mut(target) {
                total += health.take_damage((1.0 - resistance) * output);
                hit = true;
            }
        }

        if !hit {
            return BlockStatus::Failure;
        }
        ctx.set(keys::DAMAGE_TOTAL, total);
        ctx.set(keys::DAMAGE_CRITICAL, critical);
        BlockStatus::Success
    }

    fn validate(&self) -> ValidationResult {
        if self.amount.base < 0.0 {
            return Err(ConfigError::negative(Self::ID, "amount", self.amount.base));
        }
        if self.amount.per_level < 0.0 {
            return Err(ConfigError::negative(Self::ID, "scaling", self.amount.per_level));
        }
        match &self.crit {
            Some(crit) => crit.validate(Self::ID),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::arena::{ArenaWorld, EntitySpec};
    use crate::context::{ExecutionId, SkillRng};
    use crate::entity::{EntityId, Faction};

    fn setup(resistance: f32) -> (ArenaWorld, EntityId, EntityId) {
        let mut world = ArenaWorld::new();
        let source = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
        let target = world.spawn(
            EntitySpec::new(Vec3::X, Faction(2)).resistance(DamageKind::Fire, resistance),
        );
        (world, source, target)
    }

    fn ctx(source: EntityId, target: EntityId, level: u32) -> ExecutionContext {
        ExecutionContext::new(ExecutionId(0), source, level, SkillRng::with_seed(5))
            .with_targets([target])
    }

    #[test]
    fn resistance_reduces_damage() {
        let (mut world, source, target) = setup(0.3);
        let mut ctx = ctx(source, target, 1);

        let status = DamageBlock::new(10.0)
            .kind(DamageKind::Fire)
            .execute(&mut ctx, &mut world);

        assert_eq!(status, BlockStatus::Success);
        assert_eq!(world.health(target), Some(93.0));
        assert_eq!(ctx.get(keys::DAMAGE_TOTAL, 0.0f32), 7.0);
        assert!(!ctx.get(keys::DAMAGE_CRITICAL, true));
    }

    #[test]
    fn level_scaling_and_multiplier_apply() {
        let (mut world, source, target) = setup(0.0);
        let mut ctx = ctx(source, target, 3);
        ctx.set(keys::DAMAGE_MULTIPLIER, 2.0f32);

        DamageBlock::new(10.0).scaling(5.0).execute(&mut ctx, &mut world);

        // (10 + 5 * 2) * 2
        assert_eq!(world.health(target), Some(60.0));
    }

    #[test]
    fn certain_crit_doubles_output() {
        let (mut world, source, target) = setup(0.0);
        let mut ctx = ctx(source, target, 1);

        DamageBlock::new(10.0)
            .crit(CritRoll::new(1.0))
            .execute(&mut ctx, &mut world);

        assert_eq!(world.health(target), Some(80.0));
        assert!(ctx.get(keys::DAMAGE_CRITICAL, false));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        for seed in 0..20 {
            let (mut world, source, target) = setup(0.0);
            let rng = SkillRng::with_seed(seed);
            let mut ctx =
                ExecutionContext::new(ExecutionId(0), source, 1, rng).with_targets([target]);
            DamageBlock::new(50.0).jitter(true).execute(&mut ctx, &mut world);
            let dealt = ctx.get(keys::DAMAGE_TOTAL, 0.0f32);
            assert!((45.0..=55.0).contains(&dealt), "dealt {dealt}");
        }
    }

    #[test]
    fn fails_without_damageable_target() {
        let mut world = ArenaWorld::new();
        let source = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
        let prop = world.spawn(EntitySpec::new(Vec3::X, Faction(2)).without_health());
        let mut ctx = ctx(source, prop, 1);

        assert_eq!(
            DamageBlock::new(10.0).execute(&mut ctx, &mut world),
            BlockStatus::Failure
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(matches!(
            DamageBlock::new(-1.0).validate(),
            Err(ConfigError::NegativeValue { field: "amount", .. })
        ));
        assert!(DamageBlock::new(1.0).crit(CritRoll::new(1.5)).validate().is_err());
    }
}
