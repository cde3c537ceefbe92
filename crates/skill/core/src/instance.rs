//! Per-owner runtime state of one skill.
//!
//! ```text
//! Idle ──start_casting──▶ Casting ──update / finish_casting──▶ Cooldown ──update──▶ Idle
//!   │                        │
//!   │                        └──interrupt_cast (no cooldown)──▶ Idle
//!   └──start_casting (zero cast time)──────────────────────────▶ Cooldown
//! ```
//!
//! Toggle skills carry an additional `active` flag, orthogonal to the above.

use std::collections::HashMap;
use std::sync::Arc;

use crate::capability::ResourceKind;
use crate::config::SkillConfig;
use crate::context::{FromValue, Value};
use crate::entity::EntityId;
use crate::error::CastRejection;
use crate::skill::{Skill, SkillKind};

/// Coarse state of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastState {
    Idle,
    Casting,
    Cooldown,
}

/// What happened during one [`SkillInstance::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstanceUpdate {
    /// The cooldown reached zero during this update.
    pub cooldown_finished: bool,
    /// The cast progress reached 1 and the instance left `Casting`.
    pub cast_finished: bool,
}

/// A skill bound to an owner at a level.
#[derive(Clone, Debug)]
pub struct SkillInstance {
    owner: EntityId,
    skill: Arc<Skill>,
    level: u32,
    cooldown_remaining: f32,
    cooldown_total: f32,
    cast_elapsed: f32,
    casting: bool,
    active: bool,
    custom: HashMap<String, Value>,
}

impl SkillInstance {
    /// Binds `skill` to `owner`. The level is clamped to the legal range.
    pub fn new(owner: EntityId, skill: Arc<Skill>, level: u32) -> Self {
        Self {
            owner,
            skill,
            level: level.clamp(SkillConfig::MIN_LEVEL, SkillConfig::MAX_LEVEL),
            cooldown_remaining: 0.0,
            cooldown_total: 0.0,
            cast_elapsed: 0.0,
            casting: false,
            active: false,
            custom: HashMap::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn skill(&self) -> &Arc<Skill> {
        &self.skill
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Changes the level. Scaled metadata follows; an ongoing cooldown is
    /// capped at the new full cooldown. The block sequence never changes.
    pub fn set_level(&mut self, level: u32) {
        self.level = level.clamp(SkillConfig::MIN_LEVEL, SkillConfig::MAX_LEVEL);
        if self.cooldown_remaining > 0.0 {
            self.cooldown_total = self.cooldown();
            self.cooldown_remaining = self.cooldown_remaining.min(self.cooldown_total);
        }
    }

    // ===== scaled metadata =====

    pub fn cooldown(&self) -> f32 {
        self.skill.cooldown().at(self.level)
    }

    pub fn cast_time(&self) -> f32 {
        self.skill.cast_time().at(self.level)
    }

    /// Resource cost at the current level, if any.
    pub fn cost(&self) -> Option<(ResourceKind, f32)> {
        self.skill
            .cost()
            .map(|cost| (cost.resource, cost.amount.at(self.level)))
    }

    // ===== state =====

    pub fn state(&self) -> CastState {
        if self.casting {
            CastState::Casting
        } else if self.is_on_cooldown() {
            CastState::Cooldown
        } else {
            CastState::Idle
        }
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining > 0.0
    }

    pub fn is_casting(&self) -> bool {
        self.casting
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    /// 1 when ready, 0 right after the cooldown started.
    pub fn cooldown_progress(&self) -> f32 {
        if self.cooldown_total <= 0.0 || !self.is_on_cooldown() {
            1.0
        } else {
            (1.0 - self.cooldown_remaining / self.cooldown_total).clamp(0.0, 1.0)
        }
    }

    /// Fraction of the cast time elapsed; 0 when not casting.
    pub fn cast_progress(&self) -> f32 {
        if !self.casting {
            return 0.0;
        }
        let total = self.cast_time();
        if total <= 0.0 {
            1.0
        } else {
            (self.cast_elapsed / total).clamp(0.0, 1.0)
        }
    }

    pub fn can_cast(&self) -> bool {
        self.check_cast().is_ok()
    }

    /// Like [`can_cast`](Self::can_cast) but says why not.
    pub fn check_cast(&self) -> Result<(), CastRejection> {
        if self.skill.kind() == SkillKind::Passive {
            Err(CastRejection::Passive)
        } else if self.casting {
            Err(CastRejection::Casting)
        } else if self.is_on_cooldown() {
            Err(CastRejection::OnCooldown)
        } else {
            Ok(())
        }
    }

    // ===== transitions =====

    /// Enters `Casting`, or goes straight to `Cooldown` for instant skills.
    /// Returns false (and changes nothing) if the instance cannot cast.
    pub fn start_casting(&mut self) -> bool {
        if !self.can_cast() {
            return false;
        }
        self.cast_elapsed = 0.0;
        if self.cast_time() <= 0.0 {
            self.finish_casting();
        } else {
            self.casting = true;
        }
        true
    }

    /// Leaves `Casting` and charges the full cooldown.
    pub fn finish_casting(&mut self) {
        self.casting = false;
        self.cast_elapsed = 0.0;
        self.cooldown_total = self.cooldown();
        self.cooldown_remaining = self.cooldown_total;
    }

    /// Cancels an ongoing cast without charging a cooldown. Returns false if
    /// the instance was not casting.
    pub fn interrupt_cast(&mut self) -> bool {
        if !self.casting {
            return false;
        }
        self.casting = false;
        self.cast_elapsed = 0.0;
        true
    }

    /// Advances time: drains the cooldown first, then the cast.
    ///
    /// `cooldown_finished` is reported exactly once, on the update that
    /// crosses zero. A cast that completes here charges its cooldown, which
    /// starts draining on the next update.
    pub fn update(&mut self, dt: f32) -> InstanceUpdate {
        let dt = dt.max(0.0);
        let mut report = InstanceUpdate::default();

        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
            report.cooldown_finished = self.cooldown_remaining == 0.0;
        }

        if self.casting {
            self.cast_elapsed += dt;
            if self.cast_progress() >= 1.0 {
                self.finish_casting();
                report.cast_finished = true;
            }
        }

        report
    }

    /// Clears every runtime field. Custom data is kept.
    pub fn reset(&mut self) {
        self.cooldown_remaining = 0.0;
        self.cooldown_total = 0.0;
        self.cast_elapsed = 0.0;
        self.casting = false;
        self.active = false;
    }

    /// Flips the active flag of a toggle skill and returns the new value.
    /// Non-toggle skills are never active.
    pub fn toggle_active(&mut self) -> bool {
        if self.skill.kind() == SkillKind::Toggle {
            self.active = !self.active;
        }
        self.active
    }

    // ===== custom data =====

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.custom.insert(key.into(), value.into());
    }

    pub fn data<T: FromValue>(&self, key: &str, default: T) -> T {
        self.custom
            .get(key)
            .and_then(T::from_value)
            .unwrap_or(default)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Value> {
        self.custom.remove(key)
    }
}
