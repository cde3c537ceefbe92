//! Deterministic skill composition: blocks, targeting, and per-owner cast state.
//!
//! `skill-core` defines how abilities are assembled from reusable blocks and how
//! a single cast is evaluated against a [`World`]. It is free of logging, clocks
//! and threads: the runtime crate owns the tick pump and lifecycle events, and
//! drives everything here through explicit `delta_time` values.
//!
//! - [`block`]: the [`Block`] contract, leaf effects, composites and the registry
//! - [`context`]: the per-execution [`ExecutionContext`] and its seeded RNG
//! - [`targeting`]: [`TargetResolver`] and the built-in strategies
//! - [`skill`]: immutable [`Skill`] definitions, the builder, the grammar
//!   validator and the [`SequenceRun`] stepper
//! - [`instance`]: the [`SkillInstance`] cooldown/cast state machine
//! - [`capability`]: the narrow traits the core consumes from the host game
//! - [`arena`]: an in-memory [`World`] used by tests and the sandbox
pub mod arena;
pub mod block;
pub mod capability;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod instance;
pub mod skill;
pub mod targeting;

pub use glam::Vec3;

pub use arena::{ArenaEntity, ArenaWorld, EntitySpec, HealthPool, Obstacle};
pub use block::{
    Block, BlockCategory, BlockParams, BlockRef, BlockRegistry, BlockSpec, BlockStatus,
    ChainBlock, ConditionalBlock, CritRoll, DamageBlock, DelayedBlock, ForEachTargetBlock,
    HealBlock, ParamValue, Predicate, RepeatedBlock, SetVariableBlock, SkillFactory, StatusBlock,
    TeleportBlock, TeleportMode,
};
pub use capability::{
    DamageKind, Damageable, OcclusionQuery, ResourceKind, ResourcePool, SpatialQuery, StatKind,
    StatProvider, StatusReceiver, World,
};
pub use config::SkillConfig;
pub use context::{
    CastInput, ExecutionContext, ExecutionId, FromValue, SkillRng, Value, compute_seed, keys,
};
pub use entity::{EntityId, Faction, SideMask};
pub use error::{
    CastRejection, ConfigError, ErrorSeverity, GrammarViolation, SkillError, ValidationResult,
};
pub use instance::{CastState, InstanceUpdate, SkillInstance};
pub use skill::{
    BlockEntry, GrammarRule, GrammarValidator, LevelScaled, RunState, SequenceRun, Skill,
    SkillBuilder, SkillCost, SkillKind, SkippedEntry, SkipReason, StepReport,
};
pub use targeting::{
    CasterTarget, RadiusTarget, RandomSingleTarget, SingleTarget, TargetResolver,
    TargetingStrategy,
};
