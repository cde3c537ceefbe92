//! Blocks: the reusable units a skill is assembled from.
//!
//! - [`Block`]: core trait for all blocks
//! - [`BlockStatus`]: outcome of one `execute` call
//! - [`BlockCategory`]: grammar class used by the sequence validator
//! - [`leaf`]: blocks that touch the world (damage, heal, status, teleport)
//! - [`composite`]: wrappers that change *when* or *whether* another block runs
//! - [`BlockRegistry`]: id to factory table used to build blocks from data
//!
//! Blocks hold only authoring-time parameters and are shared by `Arc` between
//! every skill and execution that uses them. All per-cast state lives in the
//! [`ExecutionContext`].

pub mod category;
pub mod composite;
pub mod leaf;
pub mod params;
pub mod registry;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

use core::fmt;
use std::sync::Arc;

use crate::capability::World;
use crate::context::ExecutionContext;
use crate::error::ValidationResult;

pub use category::BlockCategory;
pub use composite::{
    ChainBlock, ConditionalBlock, DelayedBlock, ForEachTargetBlock, Predicate, RepeatedBlock,
    SkillFactory,
};
pub use leaf::{
    CritRoll, DamageBlock, HealBlock, SetVariableBlock, StatusBlock, TeleportBlock, TeleportMode,
};
pub use params::{BlockParams, BlockSpec, ParamValue};
pub use registry::{BlockFactory, BlockRegistry};
pub use status::BlockStatus;

/// Shared handle to an immutable block.
pub type BlockRef = Arc<dyn Block>;

/// A unit of skill behavior.
///
/// Implementations must be pure functions of their parameters, the context and
/// the world: two executions sharing a block never observe each other.
pub trait Block: Send + Sync + fmt::Debug {
    /// Registry id of this block kind (`"damage"`, `"conditional"`, ...).
    fn id(&self) -> &str;

    fn category(&self) -> BlockCategory;

    /// Side-effect-free precondition, checked immediately before `execute`.
    ///
    /// Not consulted again while the block is resuming deferred work.
    fn can_execute(&self, _ctx: &ExecutionContext, _world: &dyn World) -> bool {
        true
    }

    /// Performs the block against the context's targets.
    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus;

    /// Context-free configuration check run once when a skill is built.
    fn validate(&self) -> ValidationResult {
        Ok(())
    }
}
