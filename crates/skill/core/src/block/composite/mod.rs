//! Composite blocks.
//!
//! Composites wrap other blocks and decide *whether* or *when* they run. They
//! never mutate the wrapped block. Composites that span several ticks keep
//! their progress in the context's resume slot for the current entry and
//! composite depth, so one block instance can serve any number of concurrent
//! executions.

mod chain;
mod conditional;
mod delayed;
mod for_each;
mod predicate;
mod repeated;

pub use chain::ChainBlock;
pub use conditional::ConditionalBlock;
pub use delayed::DelayedBlock;
pub use for_each::{ForEachTargetBlock, SkillFactory};
pub use predicate::Predicate;
pub use repeated::RepeatedBlock;

pub(crate) use for_each::NestedRun;

/// Deferred progress of a composite, stored in the execution context.
#[derive(Debug)]
pub(crate) enum CompositeState {
    /// The gate was already passed; keep delegating without re-checking.
    Gate,
    /// Repetitions finished so far and time left before the next one.
    Repeat {
        completed: u32,
        wait: f32,
        inner_pending: bool,
    },
    /// Time waited so far.
    Delay { elapsed: f32 },
    /// Nested sub-skill runs, one per outer target.
    Nested(Vec<NestedRun>),
}
