//! In-memory [`World`] implementation.
//!
//! `ArenaWorld` stores entities in a `BTreeMap` so iteration order (and thus
//! every targeting result) is stable across runs. It backs the unit tests, the
//! runtime integration tests and the sandbox binary.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;

use crate::capability::{
    DamageKind, Damageable, OcclusionQuery, ResourceKind, ResourcePool, SpatialQuery, StatKind,
    StatProvider, StatusReceiver, World,
};
use crate::entity::{EntityId, Faction};

// ============================================================================
// Components
// ============================================================================

/// Health pool. `current` may exceed `max` after an overheal.
#[derive(Clone, Debug, PartialEq)]
pub struct HealthPool {
    current: f32,
    max: f32,
}

impl HealthPool {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn with_current(mut self, current: f32) -> Self {
        self.current = current;
        self
    }
}

impl Damageable for HealthPool {
    fn current(&self) -> f32 {
        self.current
    }

    fn max(&self) -> f32 {
        self.max
    }

    fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.current.max(0.0));
        self.current -= applied;
        applied
    }

    fn heal(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0);
        self.current += applied;
        applied
    }
}

/// Flat stat and resistance tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatTable {
    stats: HashMap<StatKind, f32>,
    resistances: HashMap<DamageKind, f32>,
}

impl StatProvider for StatTable {
    fn stat(&self, kind: StatKind) -> f32 {
        self.stats.get(&kind).copied().unwrap_or(0.0)
    }

    fn resistance(&self, kind: DamageKind) -> f32 {
        self.resistances.get(&kind).copied().unwrap_or(0.0)
    }
}

/// A status applied to an arena entity.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedStatus {
    pub name: String,
    pub duration: f32,
}

/// Records every status applied; names in `immunities` are refused.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusLog {
    applied: Vec<AppliedStatus>,
    immunities: Vec<String>,
}

impl StatusLog {
    pub fn applied(&self) -> &[AppliedStatus] {
        &self.applied
    }

    pub fn has(&self, name: &str) -> bool {
        self.applied.iter().any(|s| s.name == name)
    }
}

impl StatusReceiver for StatusLog {
    fn apply_status(&mut self, name: &str, duration: f32) -> bool {
        if self.immunities.iter().any(|i| i == name) {
            return false;
        }
        self.applied.push(AppliedStatus {
            name: name.to_owned(),
            duration,
        });
        true
    }
}

/// Resource balances keyed by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceBank {
    pools: HashMap<ResourceKind, f32>,
}

impl ResourcePool for ResourceBank {
    fn available(&self, kind: ResourceKind) -> f32 {
        self.pools.get(&kind).copied().unwrap_or(0.0)
    }

    fn spend(&mut self, kind: ResourceKind, amount: f32) -> bool {
        let balance = self.pools.entry(kind).or_insert(0.0);
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        true
    }

    fn refund(&mut self, kind: ResourceKind, amount: f32) {
        *self.pools.entry(kind).or_insert(0.0) += amount;
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A single arena entity.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaEntity {
    pub id: EntityId,
    pub position: Vec3,
    pub facing: Vec3,
    pub faction: Faction,
    pub health: Option<HealthPool>,
    pub stats: StatTable,
    pub statuses: StatusLog,
    pub resources: ResourceBank,
}

/// Builder for arena entities.
#[derive(Clone, Debug)]
pub struct EntitySpec {
    position: Vec3,
    facing: Vec3,
    faction: Faction,
    health: Option<HealthPool>,
    stats: StatTable,
    statuses: StatusLog,
    resources: ResourceBank,
}

impl EntitySpec {
    /// A 100 HP entity facing +Z.
    pub fn new(position: Vec3, faction: Faction) -> Self {
        Self {
            position,
            facing: Vec3::Z,
            faction,
            health: Some(HealthPool::new(100.0)),
            stats: StatTable::default(),
            statuses: StatusLog::default(),
            resources: ResourceBank::default(),
        }
    }

    pub fn health(mut self, max: f32) -> Self {
        self.health = Some(HealthPool::new(max));
        self
    }

    pub fn current_health(mut self, current: f32) -> Self {
        let pool = self.health.take().unwrap_or_else(|| HealthPool::new(current));
        self.health = Some(pool.with_current(current));
        self
    }

    /// Removes the health pool: the entity is no longer damageable.
    pub fn without_health(mut self) -> Self {
        self.health = None;
        self
    }

    pub fn facing(mut self, facing: Vec3) -> Self {
        self.facing = facing.normalize_or_zero();
        self
    }

    pub fn stat(mut self, kind: StatKind, value: f32) -> Self {
        self.stats.stats.insert(kind, value);
        self
    }

    pub fn resistance(mut self, kind: DamageKind, value: f32) -> Self {
        self.stats.resistances.insert(kind, value);
        self
    }

    pub fn immune_to(mut self, status: impl Into<String>) -> Self {
        self.statuses.immunities.push(status.into());
        self
    }

    pub fn resource(mut self, kind: ResourceKind, amount: f32) -> Self {
        self.resources.pools.insert(kind, amount);
        self
    }
}

/// Spherical line-of-sight blocker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Returns true if the segment `from → to` passes through the sphere.
    fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let segment = to - from;
        let length_sq = segment.length_squared();
        let t = if length_sq <= f32::EPSILON {
            0.0
        } else {
            ((self.center - from).dot(segment) / length_sq).clamp(0.0, 1.0)
        };
        let closest = from + segment * t;
        closest.distance_squared(self.center) < self.radius * self.radius
    }
}

// ============================================================================
// World
// ============================================================================

/// Deterministic in-memory world.
#[derive(Clone, Debug, Default)]
pub struct ArenaWorld {
    entities: BTreeMap<EntityId, ArenaEntity>,
    obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entity and returns its id.
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            ArenaEntity {
                id,
                position: spec.position,
                facing: spec.facing,
                faction: spec.faction,
                health: spec.health,
                stats: spec.stats,
                statuses: spec.statuses,
                resources: spec.resources,
            },
        );
        id
    }

    /// Destroys an entity. Returns the removed entity, if any.
    pub fn despawn(&mut self, id: EntityId) -> Option<ArenaEntity> {
        self.entities.remove(&id)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn entity(&self, id: EntityId) -> Option<&ArenaEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut ArenaEntity> {
        self.entities.get_mut(&id)
    }

    /// Current health, or `None` if the entity is gone or has no pool.
    pub fn health(&self, id: EntityId) -> Option<f32> {
        self.entity(id)?.health.as_ref().map(Damageable::current)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Removes every entity whose health pool is depleted. Returns their ids.
    pub fn reap_depleted(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.health.as_ref().is_some_and(Damageable::is_depleted))
            .map(|e| e.id)
            .collect();
        for id in &dead {
            self.entities.remove(id);
        }
        dead
    }
}

impl SpatialQuery for ArenaWorld {
    fn find_entities_within_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        self.entities
            .values()
            .filter(|e| e.position.distance_squared(center) <= radius_sq)
            .map(|e| e.id)
            .collect()
    }

    fn all_entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }
}

impl OcclusionQuery for ArenaWorld {
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self.obstacles.iter().any(|o| o.blocks(from, to))
    }
}

impl World for ArenaWorld {
    fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|e| e.position)
    }

    fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.position = position;
                true
            }
            None => false,
        }
    }

    fn facing(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|e| e.facing)
    }

    fn faction(&self, id: EntityId) -> Option<Faction> {
        self.entities.get(&id).map(|e| e.faction)
    }

    fn damageable(&self, id: EntityId) -> Option<&dyn Damageable> {
        let pool = self.entities.get(&id)?.health.as_ref()?;
        Some(pool)
    }

    fn damageable_mut(&mut self, id: EntityId) -> Option<&mut dyn Damageable> {
        let pool = self.entities.get_mut(&id)?.health.as_mut()?;
        Some(pool)
    }

    fn stats(&self, id: EntityId) -> Option<&dyn StatProvider> {
        self.entities.get(&id).map(|e| &e.stats as &dyn StatProvider)
    }

    fn status_receiver(&mut self, id: EntityId) -> Option<&mut dyn StatusReceiver> {
        self.entities
            .get_mut(&id)
            .map(|e| &mut e.statuses as &mut dyn StatusReceiver)
    }

    fn resources(&mut self, id: EntityId) -> Option<&mut dyn ResourcePool> {
        self.entities
            .get_mut(&id)
            .map(|e| &mut e.resources as &mut dyn ResourcePool)
    }
}
