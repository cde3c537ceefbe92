//! Runtime orchestration for skill execution.
//!
//! This crate drives the deterministic `skill-core` model over time: it owns
//! skill instances, turns cast requests into executions, steps them every
//! tick, enforces the safety timeout and reports every outcome on a
//! topic-based event bus.
//!
//! Modules are organized by responsibility:
//! - [`executor`] hosts the orchestrator
//! - [`events`] provides the lifecycle event bus
//! - [`config`] loads executor settings from the environment
pub mod config;
pub mod error;
pub mod events;
pub mod executor;

pub use config::ExecutorConfig;
pub use error::{Result, RuntimeError};
pub use events::{
    CastInfo, EventBus, FailureReason, InterruptCause, SkillEvent, Subscription, Topic,
};
pub use executor::{InstanceId, SkillExecutor};
