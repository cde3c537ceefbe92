//! Built-in targeting strategy implementations.

pub mod caster;
pub mod radius;
pub mod random_single;
pub mod single;

pub use caster::CasterTarget;
pub use radius::RadiusTarget;
pub use random_single::RandomSingleTarget;
pub use single::SingleTarget;

use crate::capability::World;
use crate::entity::{EntityId, SideMask};

/// Shared candidate filter for area and random strategies: the candidate must
/// be alive, expose a health pool, and pass the side mask.
pub(crate) fn is_eligible(
    source: EntityId,
    candidate: EntityId,
    world: &dyn World,
    sides: SideMask,
) -> bool {
    if !world.is_alive(candidate) || world.damageable(candidate).is_none() {
        return false;
    }
    let same_faction = match (world.faction(source), world.faction(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    sides.admits(candidate == source, same_faction)
}
