//! Capabilities consumed from the host game.
//!
//! The core never owns entities. Everything it needs to read or mutate is
//! reached through these narrow traits, composed by [`World`]. Hosts implement
//! them on top of their own ECS or object model; [`ArenaWorld`](crate::ArenaWorld)
//! is a ready-made in-memory implementation.

use glam::Vec3;

use crate::entity::{EntityId, Faction};

// ============================================================================
// Kinds
// ============================================================================

/// Damage channel used to look up resistances.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    #[default]
    Physical,
    Fire,
    Frost,
    Lightning,
    Poison,
    Arcane,
}

/// Scalar stats a host may expose.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatKind {
    Power,
    Defense,
    HealingPower,
    Speed,
}

/// Resource pools a skill cost can draw from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Mana,
    Energy,
    Health,
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Something with a health pool.
pub trait Damageable {
    fn current(&self) -> f32;

    fn max(&self) -> f32;

    /// Removes up to `amount` and returns what was actually removed.
    fn take_damage(&mut self, amount: f32) -> f32;

    /// Adds exactly `amount` and returns it.
    ///
    /// Caps are the caller's business; heal blocks compute the allowance first.
    fn heal(&mut self, amount: f32) -> f32;

    fn is_depleted(&self) -> bool {
        self.current() <= 0.0
    }
}

/// Read-only stat and resistance lookups.
pub trait StatProvider {
    fn stat(&self, kind: StatKind) -> f32;

    /// Fraction of incoming damage of `kind` that is ignored, in `[0, 1]`.
    fn resistance(&self, kind: DamageKind) -> f32;
}

/// Something that accepts named, timed statuses.
pub trait StatusReceiver {
    /// Returns false if the status was refused (immune, full stacks, ...).
    fn apply_status(&mut self, name: &str, duration: f32) -> bool;
}

/// Spendable resources used for skill costs.
pub trait ResourcePool {
    fn available(&self, kind: ResourceKind) -> f32;

    /// Deducts `amount` if affordable. Returns false and leaves the pool
    /// untouched otherwise.
    fn spend(&mut self, kind: ResourceKind, amount: f32) -> bool;

    fn refund(&mut self, kind: ResourceKind, amount: f32);
}

/// Spatial lookups. Implementations decide how "within radius" is indexed.
pub trait SpatialQuery {
    /// All live entities whose position lies within `radius` of `center`.
    fn find_entities_within_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// All live entities, in a stable order.
    fn all_entities(&self) -> Vec<EntityId>;
}

/// Line-of-sight checks. The default sees through everything.
pub trait OcclusionQuery {
    fn has_line_of_sight(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Everything a cast can touch.
pub trait World: SpatialQuery + OcclusionQuery {
    /// Returns true if the entity exists and has not been destroyed.
    fn is_alive(&self, id: EntityId) -> bool;

    fn position(&self, id: EntityId) -> Option<Vec3>;

    /// Moves the entity. Returns false if it does not exist.
    fn set_position(&mut self, id: EntityId, position: Vec3) -> bool;

    /// Unit forward vector, if the host tracks orientation.
    fn facing(&self, _id: EntityId) -> Option<Vec3> {
        None
    }

    fn faction(&self, id: EntityId) -> Option<Faction>;

    fn damageable(&self, id: EntityId) -> Option<&dyn Damageable>;

    fn damageable_mut(&mut self, id: EntityId) -> Option<&mut dyn Damageable>;

    fn stats(&self, _id: EntityId) -> Option<&dyn StatProvider> {
        None
    }

    fn status_receiver(&mut self, _id: EntityId) -> Option<&mut dyn StatusReceiver> {
        None
    }

    fn resources(&mut self, _id: EntityId) -> Option<&mut dyn ResourcePool> {
        None
    }

    /// Resistance of `id` against `kind`, clamped to `[0, 1]`; zero without stats.
    fn resistance(&self, id: EntityId, kind: DamageKind) -> f32 {
        self.stats(id)
            .map(|stats| stats.resistance(kind))
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }

    /// Euclidean distance between two live entities.
    fn distance(&self, a: EntityId, b: EntityId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }
}
