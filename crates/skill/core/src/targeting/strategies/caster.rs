use crate::capability::World;
use crate::context::SkillRng;
use crate::entity::EntityId;
use crate::targeting::TargetingStrategy;

/// Targets the source itself. Used by self-buffs and as the default for
/// `ForEachTarget` sub-skills, where the source is the outer target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CasterTarget;

impl TargetingStrategy for CasterTarget {
    fn resolve(&self, source: EntityId, world: &dyn World, _rng: &mut SkillRng) -> Vec<EntityId> {
        if world.is_alive(source) {
            vec![source]
        } else {
            Vec::new()
        }
    }

    fn name(&self) -> &'static str {
        "caster"
    }

    fn description(&self) -> &'static str {
        "The casting entity"
    }
}
