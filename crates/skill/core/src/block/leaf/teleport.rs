use glam::Vec3;

use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::World;
use crate::context::{ExecutionContext, keys};
use crate::error::{ConfigError, ValidationResult};

/// Where a teleport sends the source.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TeleportMode {
    /// Onto the first target's position.
    ToTarget,
    /// A fixed world position.
    ToPosition(Vec3),
    /// `offset` units behind the first target, relative to its facing.
    BehindTarget { offset: f32 },
    /// `distance` units straight away from the first target.
    AwayFromTarget { distance: f32 },
    /// The aim point captured in the cast input.
    ToAimPoint,
}

impl TeleportMode {
    /// Parses the registry spelling (`to_target`, `behind_target`, ...).
    /// Parameterized modes start with a zero parameter.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "to_target" => TeleportMode::ToTarget,
            "to_position" => TeleportMode::ToPosition(Vec3::ZERO),
            "behind_target" => TeleportMode::BehindTarget { offset: 0.0 },
            "away_from_target" => TeleportMode::AwayFromTarget { distance: 0.0 },
            "to_aim_point" => TeleportMode::ToAimPoint,
            _ => return None,
        })
    }
}

/// Moves the source entity.
///
/// Fails without moving when the destination cannot be computed, lies farther
/// than `max_distance` from the source, or (with line-of-sight required) is
/// hidden behind an obstacle. Writes [`keys::TELEPORT_DESTINATION`].
#[derive(Clone, Debug, PartialEq)]
pub struct TeleportBlock {
    mode: TeleportMode,
    max_distance: f32,
    require_line_of_sight: bool,
}

impl TeleportBlock {
    pub const ID: &'static str = "teleport";

    pub fn new(mode: TeleportMode) -> Self {
        Self {
            mode,
            max_distance: f32::INFINITY,
            require_line_of_sight: false,
        }
    }

    pub fn max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn require_line_of_sight(mut self, required: bool) -> Self {
        self.require_line_of_sight = required;
        self
    }

    pub fn mode(&self) -> TeleportMode {
        self.mode
    }

    fn destination(&self, ctx: &ExecutionContext, world: &dyn World, origin: Vec3) -> Option<Vec3> {
        let first_target = || {
            let id = *ctx.targets().first()?;
            Some((id, world.position(id)?))
        };

        match self.mode {
            TeleportMode::ToTarget => first_target().map(|(_, at)| at),
            TeleportMode::ToPosition(point) => Some(point),
            TeleportMode::BehindTarget { offset } => {
                let (id, at) = first_target()?;
                let forward = world
                    .facing(id)
                    .map(Vec3::normalize_or_zero)
                    .filter(|f| *f != Vec3::ZERO)
                    .unwrap_or_else(|| (at - origin).normalize_or_zero());
                if forward == Vec3::ZERO {
                    return None;
                }
                Some(at - forward * offset)
            }
            TeleportMode::AwayFromTarget { distance } => {
                let (_, at) = first_target()?;
                let away = (origin - at).normalize_or_zero();
                if away == Vec3::ZERO {
                    return None;
                }
                Some(origin + away * distance)
            }
            TeleportMode::ToAimPoint => ctx.input().aim_point,
        }
    }
}

impl Block for TeleportBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Effect
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let source = ctx.source();
        let Some(origin) = world.position(source) else {
            return BlockStatus::Failure;
        };
        let Some(destination) = self.destination(ctx, &*world, origin) else {
            return BlockStatus::Failure;
        };

        if origin.distance(destination) > self.max_distance {
            return BlockStatus::Failure;
        }
        if self.require_line_of_sight && !world.has_line_of_sight(origin, destination) {
            return BlockStatus::Failure;
        }
        if !world.set_position(source, destination) {
            return BlockStatus::Failure;
        }

        ctx.set(keys::TELEPORT_DESTINATION, destination);
        BlockStatus::Success
    }

    fn validate(&self) -> ValidationResult {
        if self.max_distance.is_nan() || self.max_distance < 0.0 {
            return Err(ConfigError::negative(Self::ID, "max_distance", self.max_distance));
        }
        match self.mode {
            TeleportMode::BehindTarget { offset } if offset < 0.0 => {
                Err(ConfigError::negative(Self::ID, "offset", offset))
            }
            TeleportMode::AwayFromTarget { distance } if distance < 0.0 => {
                Err(ConfigError::negative(Self::ID, "distance", distance))
            }
            _ => Ok(()),
        }
    }
}
