use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::World;
use crate::config::SkillConfig;
use crate::context::{ExecutionContext, keys};
use crate::error::{ConfigError, ValidationResult};
use crate::skill::LevelScaled;

use super::{CritRoll, roll_output};

/// Restores health on every target with a health pool.
///
/// Never raises health above the cap: 100% of max by default, or
/// `overheal_cap_percent` of max when overhealing is allowed. A target already
/// at the cap still counts as reached; the block only fails when no target has
/// a health pool at all.
#[derive(Clone, Debug, PartialEq)]
pub struct HealBlock {
    amount: LevelScaled,
    crit: Option<CritRoll>,
    jitter: bool,
    can_overheal: bool,
    overheal_cap_percent: f32,
}

impl HealBlock {
    pub const ID: &'static str = "heal";

    pub fn new(base: f32) -> Self {
        Self {
            amount: LevelScaled::fixed(base),
            crit: None,
            jitter: false,
            can_overheal: false,
            overheal_cap_percent: SkillConfig::BASE_HEAL_CAP_PERCENT,
        }
    }

    pub fn scaling(mut self, per_level: f32) -> Self {
        self.amount.per_level = per_level;
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

    /// Allows health up to `cap_percent` of max.
    pub fn overheal(mut self, cap_percent: f32) -> Self {
        self.can_overheal = true;
        self.overheal_cap_percent = cap_percent;
        self
    }

    fn cap_percent(&self) -> f32 {
        if self.can_overheal {
            self.overheal_cap_percent
        } else {
            SkillConfig::BASE_HEAL_CAP_PERCENT
        }
    }
}

impl Block for HealBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Effect
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let magnitude = self.amount.at(ctx.level());
        let (output, critical) =
            roll_output(ctx, magnitude, self.crit, self.jitter, keys::HEAL_MULTIPLIER);

        let cap_percent = self.cap_percent();
        let mut total = 0.0f32;
        let mut reached = false;
        for &target in ctx.targets() {
            let Some(health) = world.damageable_mut(target) else {
                continue;
            };
            reached = true;
            let allowance = (health.max() * cap_percent / 100.0 - health.current()).max(0.0);
            let amount = output.min(allowance);
            if amount > 0.0 {
                total += health.heal(amount);
            }
        }

        if !reached {
            return BlockStatus::Failure;
        }
        ctx.set(keys::HEAL_TOTAL, total);
        ctx.set(keys::HEAL_CRITICAL, critical);
        BlockStatus::Success
    }

    fn validate(&self) -> ValidationResult {
        if self.amount.base < 0.0 {
            return Err(ConfigError::negative(Self::ID, "amount", self.amount.base));
        }
        if self.amount.per_level < 0.0 {
            return Err(ConfigError::negative(Self::ID, "scaling", self.amount.per_level));
        }
        if self.can_overheal && self.overheal_cap_percent < SkillConfig::BASE_HEAL_CAP_PERCENT {
            return Err(ConfigError::invalid(
                Self::ID,
                "overheal_cap_percent",
                format!("{} is below the base cap", self.overheal_cap_percent),
            ));
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

    fn wounded(current: f32) -> (ArenaWorld, EntityId) {
        let mut world = ArenaWorld::new();
        let id = world.spawn(
            EntitySpec::new(Vec3::ZERO, Faction(1))
                .health(100.0)
                .current_health(current),
        );
        (world, id)
    }

    fn ctx(target: EntityId) -> ExecutionContext {
        ExecutionContext::new(ExecutionId(0), target, 1, SkillRng::with_seed(1))
            .with_targets([target])
    }

    #[test]
    fn caps_at_max_health() {
        let (mut world, id) = wounded(90.0);
        let mut ctx = ctx(id);

        assert_eq!(HealBlock::new(50.0).execute(&mut ctx, &mut world), BlockStatus::Success);
        assert_eq!(world.health(id), Some(100.0));
        assert_eq!(ctx.get(keys::HEAL_TOTAL, 0.0f32), 10.0);
    }

    #[test]
    fn overheal_respects_its_own_cap() {
        let (mut world, id) = wounded(90.0);
        let mut ctx = ctx(id);

        HealBlock::new(50.0).overheal(120.0).execute(&mut ctx, &mut world);

        assert_eq!(world.health(id), Some(120.0));
    }

    #[test]
    fn full_health_target_still_succeeds() {
        let (mut world, id) = wounded(100.0);
        let mut ctx = ctx(id);

        assert_eq!(HealBlock::new(5.0).execute(&mut ctx, &mut world), BlockStatus::Success);
        assert_eq!(ctx.get(keys::HEAL_TOTAL, -1.0f32), 0.0);
    }

    #[test]
    fn overheal_cap_below_base_is_invalid() {
        assert!(HealBlock::new(5.0).overheal(80.0).validate().is_err());
    }
}
