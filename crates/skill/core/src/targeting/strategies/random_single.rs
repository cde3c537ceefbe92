//! Uniform random pick.

use crate::capability::World;
use crate::context::SkillRng;
use crate::entity::{EntityId, SideMask};
use crate::targeting::TargetingStrategy;

use super::is_eligible;

/// One entity drawn uniformly from every damageable entity passing `sides`,
/// with no distance bound. Uses the execution RNG, so a fixed seed replays the
/// same pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSingleTarget {
    pub sides: SideMask,
}

impl RandomSingleTarget {
    pub fn new(sides: SideMask) -> Self {
        Self { sides }
    }
}

impl TargetingStrategy for RandomSingleTarget {
    fn resolve(&self, source: EntityId, world: &dyn World, rng: &mut SkillRng) -> Vec<EntityId> {
        if !world.is_alive(source) {
            return Vec::new();
        }
        let pool: Vec<EntityId> = world
            .all_entities()
            .into_iter()
            .filter(|candidate| is_eligible(source, *candidate, world, self.sides))
            .collect();
        rng.choose(&pool).copied().into_iter().collect()
    }

    fn name(&self) -> &'static str {
        "random"
    }

    fn description(&self) -> &'static str {
        "A single matching entity picked at random"
    }
}
