//! Fixed single-entity targeting.

use crate::capability::World;
use crate::context::SkillRng;
use crate::entity::EntityId;
use crate::targeting::TargetingStrategy;

/// Targets one pre-chosen entity while it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleTarget(pub EntityId);

impl TargetingStrategy for SingleTarget {
    fn resolve(&self, _source: EntityId, world: &dyn World, _rng: &mut SkillRng) -> Vec<EntityId> {
        if world.is_alive(self.0) {
            vec![self.0]
        } else {
            Vec::new()
        }
    }

    fn name(&self) -> &'static str {
        "single"
    }

    fn description(&self) -> &'static str {
        "One fixed entity, dropped once destroyed"
    }
}
