//! Target resolution.
//!
//! A [`TargetResolver`] turns a source entity into an ordered list of targets
//! by delegating to a [`TargetingStrategy`]. Resolution never fails: an empty
//! list is a valid answer, and a destroyed source always resolves to nothing.

pub mod strategies;

use core::fmt;
use std::sync::Arc;

use crate::block::BlockParams;
use crate::capability::World;
use crate::context::SkillRng;
use crate::entity::{EntityId, SideMask};
use crate::error::ConfigError;

pub use strategies::{CasterTarget, RadiusTarget, RandomSingleTarget, SingleTarget};

/// A pure selection rule over the world.
pub trait TargetingStrategy: Send + Sync + fmt::Debug {
    /// Returns the targets for `source`, in a stable order.
    ///
    /// Implementations must not mutate anything but `rng`.
    fn resolve(&self, source: EntityId, world: &dyn World, rng: &mut SkillRng) -> Vec<EntityId>;

    /// Short identifier used in logs and by [`TargetResolver::from_name`].
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }
}

/// Facade over the active targeting strategy of a skill.
#[derive(Clone, Debug)]
pub struct TargetResolver {
    strategy: Arc<dyn TargetingStrategy>,
}

impl TargetResolver {
    pub fn new(strategy: impl TargetingStrategy + 'static) -> Self {
        Self {
            strategy: Arc::new(strategy),
        }
    }

    pub fn from_arc(strategy: Arc<dyn TargetingStrategy>) -> Self {
        Self { strategy }
    }

    pub fn single(entity: EntityId) -> Self {
        Self::new(SingleTarget(entity))
    }

    pub fn caster() -> Self {
        Self::new(CasterTarget)
    }

    pub fn radius(radius: f32, sides: SideMask) -> Self {
        Self::new(RadiusTarget::new(radius, sides))
    }

    pub fn random_single(sides: SideMask) -> Self {
        Self::new(RandomSingleTarget::new(sides))
    }

    /// Builds a built-in strategy by name.
    ///
    /// # Supported Names
    ///
    /// - `"single"` - requires an `entity` parameter
    /// - `"caster"` - the source itself
    /// - `"radius"` - requires `radius`; optional `sides` (default `enemies`)
    /// - `"random"` - optional `sides` (default `enemies`)
    ///
    /// # Errors
    ///
    /// Unknown names and missing or malformed parameters.
    pub fn from_name(name: &str, params: &BlockParams) -> Result<Self, ConfigError> {
        const OWNER: &str = "targeting";
        let resolver = match name {
            "single" => {
                let raw = params.int(OWNER, "entity")?;
                let id = u32::try_from(raw).map_err(|_| {
                    ConfigError::invalid(OWNER, "entity", format!("{raw} is not an entity id"))
                })?;
                Self::single(EntityId(id))
            }
            "caster" => Self::caster(),
            "radius" => {
                let radius = params.float(OWNER, "radius")?;
                if radius < 0.0 {
                    return Err(ConfigError::negative(OWNER, "radius", radius));
                }
                Self::radius(radius, params.sides_or(OWNER, "sides", SideMask::ENEMIES)?)
            }
            "random" => Self::random_single(params.sides_or(OWNER, "sides", SideMask::ENEMIES)?),
            other => {
                return Err(ConfigError::invalid(
                    OWNER,
                    "strategy",
                    format!("unknown strategy `{other}`"),
                ));
            }
        };
        Ok(resolver)
    }

    /// Resolves targets for `source`; `[]` when the source is gone.
    pub fn resolve(
        &self,
        source: EntityId,
        world: &dyn World,
        rng: &mut SkillRng,
    ) -> Vec<EntityId> {
        if !world.is_alive(source) {
            return Vec::new();
        }
        self.strategy.resolve(source, world, rng)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn strategy_description(&self) -> &'static str {
        self.strategy.description()
    }
}

impl Default for TargetResolver {
    /// Targets the caster.
    fn default() -> Self {
        Self::caster()
    }
}
