//! Area targeting around the source.

use crate::capability::World;
use crate::context::SkillRng;
use crate::entity::{EntityId, SideMask};
use crate::targeting::TargetingStrategy;

use super::is_eligible;

/// Every damageable entity within `radius` of the source that passes `sides`.
///
/// **Behavior:**
/// - Euclidean distance from the source position, boundary inclusive
/// - Order follows the world's spatial query
/// - The source is only included when `sides` contains `SELF`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusTarget {
    pub radius: f32,
    pub sides: SideMask,
}

impl RadiusTarget {
    pub fn new(radius: f32, sides: SideMask) -> Self {
        Self {
            radius: radius.max(0.0),
            sides,
        }
    }
}

impl TargetingStrategy for RadiusTarget {
    fn resolve(&self, source: EntityId, world: &dyn World, _rng: &mut SkillRng) -> Vec<EntityId> {
        let Some(center) = world.position(source) else {
            return Vec::new();
        };
        world
            .find_entities_within_radius(center, self.radius)
            .into_iter()
            .filter(|candidate| is_eligible(source, *candidate, world, self.sides))
            .collect()
    }

    fn name(&self) -> &'static str {
        "radius"
    }

    fn description(&self) -> &'static str {
        "All matching entities within a radius of the caster"
    }
}
