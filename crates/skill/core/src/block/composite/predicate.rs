//! Conditions evaluated by [`ConditionalBlock`](super::ConditionalBlock).

use core::fmt;
use std::sync::Arc;

use crate::capability::World;
use crate::context::{ExecutionContext, Value};

type CustomPredicate = dyn Fn(&ExecutionContext, &dyn World) -> bool + Send + Sync;

/// A condition over the execution context and the world.
///
/// Predicates are data so that the registry can build them from parameters;
/// `Custom` covers anything the built-in variants cannot express.
#[derive(Clone)]
pub enum Predicate {
    Always,
    /// At least `n` targets remain.
    TargetCountAtLeast(usize),
    /// The variable exists and equals the given value.
    VariableEquals(String, Value),
    /// The variable is a `Bool(true)`.
    VariableTrue(String),
    /// Passes with probability `p`, drawn from the context RNG.
    Chance(f32),
    /// The source's health fraction is strictly below the threshold.
    SourceHealthBelow(f32),
    Not(Box<Predicate>),
    Custom(Arc<CustomPredicate>),
}

impl Predicate {
    pub fn custom(
        f: impl Fn(&ExecutionContext, &dyn World) -> bool + Send + Sync + 'static,
    ) -> Self {
        Predicate::Custom(Arc::new(f))
    }

    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate. Only `Chance` touches the context (its RNG).
    pub fn evaluate(&self, ctx: &mut ExecutionContext, world: &dyn World) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::TargetCountAtLeast(n) => ctx.targets().len() >= *n,
            Predicate::VariableEquals(key, expected) => ctx.value(key) == Some(expected),
            Predicate::VariableTrue(key) => ctx.get(key, false),
            Predicate::Chance(p) => ctx.rng().chance(*p),
            Predicate::SourceHealthBelow(threshold) => world
                .damageable(ctx.source())
                .filter(|health| health.max() > 0.0)
                .is_some_and(|health| health.current() / health.max() < *threshold),
            Predicate::Not(inner) => !inner.evaluate(ctx, world),
            Predicate::Custom(f) => f(&*ctx, world),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => f.write_str("Always"),
            Predicate::TargetCountAtLeast(n) => {
                f.debug_tuple("TargetCountAtLeast").field(n).finish()
            }
            Predicate::VariableEquals(k, v) => {
                f.debug_tuple("VariableEquals").field(k).field(v).finish()
            }
            Predicate::VariableTrue(k) => f.debug_tuple("VariableTrue").field(k).finish(),
            Predicate::Chance(p) => f.debug_tuple("Chance").field(p).finish(),
            Predicate::SourceHealthBelow(t) => f.debug_tuple("SourceHealthBelow").field(t).finish(),
            Predicate::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Predicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::arena::{ArenaWorld, EntitySpec};
    use crate::context::{ExecutionId, SkillRng};
    use crate::entity::Faction;

    #[test]
    fn health_threshold_is_strict() {
        let mut world = ArenaWorld::new();
        let id = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)).current_health(50.0));
        let mut ctx = ExecutionContext::new(ExecutionId(0), id, 1, SkillRng::with_seed(0));

        assert!(!Predicate::SourceHealthBelow(0.5).evaluate(&mut ctx, &world));
        assert!(Predicate::SourceHealthBelow(0.51).evaluate(&mut ctx, &world));
        assert!(Predicate::SourceHealthBelow(0.5).negate().evaluate(&mut ctx, &world));
    }

    #[test]
    fn variable_predicates_read_the_store() {
        let world = ArenaWorld::new();
        let mut ctx = ExecutionContext::new(
            ExecutionId(0),
            crate::entity::EntityId(0),
            1,
            SkillRng::with_seed(0),
        );
        ctx.set("combo", 3i64);
        ctx.set("primed", true);

        assert!(
            Predicate::VariableEquals("combo".into(), Value::Int(3)).evaluate(&mut ctx, &world)
        );
        assert!(Predicate::VariableTrue("primed".into()).evaluate(&mut ctx, &world));
        assert!(!Predicate::VariableTrue("combo".into()).evaluate(&mut ctx, &world));
        assert!(!Predicate::TargetCountAtLeast(1).evaluate(&mut ctx, &world));
    }
}
