//! Topic-based lifecycle notifications.
//!
//! The executor publishes every outcome here; nothing else reports what a
//! cast did. Consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{EventBus, Subscription, Topic};
pub use types::{CastInfo, FailureReason, InterruptCause, SkillEvent};
