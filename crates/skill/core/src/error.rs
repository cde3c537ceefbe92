//! Common error infrastructure for skill-core.
//!
//! Errors fall into three families:
//!
//! - [`ConfigError`]: a skill or block definition is malformed. Raised only while
//!   building or validating, never while a cast is running.
//! - [`CastRejection`]: a cast request failed a precondition. Expected and cheap;
//!   the request is dropped with no state change.
//! - Runtime failures are not errors at all: blocks report them through
//!   [`BlockStatus`](crate::BlockStatus) and the orchestrator turns them into
//!   lifecycle events.

use crate::block::BlockCategory;
use crate::capability::ResourceKind;

/// Result of a context-free configuration check.
pub type ValidationResult = Result<(), ConfigError>;

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Retrying later (or with different input) may succeed.
    ///
    /// Examples: skill on cooldown, not enough mana
    Recoverable,

    /// The definition itself is wrong and must be fixed by the author.
    ///
    /// Examples: unknown block id, illegal block order
    Validation,

    /// Unexpected inconsistency that indicates a bug.
    Internal,

    /// Unrecoverable.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all skill-core errors.
///
/// Provides a uniform interface for classification so the runtime can pick a
/// log level and tests can match on stable codes.
pub trait SkillError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str;
}

// ============================================================================
// Grammar
// ============================================================================

/// First illegal adjacency found while walking a block sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("block {index} ({current}) may not {}", placement(.previous))]
pub struct GrammarViolation {
    /// Index of the offending entry.
    pub index: usize,
    /// Category of the entry before it (`None` when the entry opens the sequence).
    pub previous: Option<BlockCategory>,
    /// Category of the offending entry.
    pub current: BlockCategory,
}

fn placement(previous: &Option<BlockCategory>) -> String {
    match previous {
        Some(previous) => format!("follow a {previous} block"),
        None => "start a sequence".to_owned(),
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while building or validating skill definitions.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No factory is registered under this id.
    #[error("unknown block id `{id}`")]
    UnknownBlock { id: String },

    /// A required authoring parameter was not supplied.
    #[error("block `{block}` is missing parameter `{param}`")]
    MissingParameter { block: String, param: String },

    /// A parameter had the wrong type or an unusable value.
    #[error("block `{block}` has invalid parameter `{param}`: {reason}")]
    InvalidParameter {
        block: String,
        param: String,
        reason: String,
    },

    /// A magnitude or duration was negative.
    #[error("`{field}` of `{owner}` must not be negative (got {value})")]
    NegativeValue {
        owner: String,
        field: &'static str,
        value: f32,
    },

    /// A skill was built without any blocks.
    #[error("skill `{skill}` has no blocks")]
    EmptySequence { skill: String },

    /// The block categories are in an illegal order.
    #[error("skill `{skill}`: {violation}")]
    Grammar {
        skill: String,
        #[source]
        violation: GrammarViolation,
    },

    /// A skill was used where a validated one is required.
    #[error("skill `{skill}` has not passed validation")]
    NotValidated { skill: String },
}

impl ConfigError {
    pub(crate) fn negative(owner: impl Into<String>, field: &'static str, value: f32) -> Self {
        Self::NegativeValue {
            owner: owner.into(),
            field,
            value,
        }
    }

    pub(crate) fn invalid(
        block: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            block: block.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Returns the grammar violation carried by this error, if any.
    pub fn violation(&self) -> Option<&GrammarViolation> {
        match self {
            Self::Grammar { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

impl SkillError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownBlock { .. } => "CONFIG_UNKNOWN_BLOCK",
            Self::MissingParameter { .. } => "CONFIG_MISSING_PARAMETER",
            Self::InvalidParameter { .. } => "CONFIG_INVALID_PARAMETER",
            Self::NegativeValue { .. } => "CONFIG_NEGATIVE_VALUE",
            Self::EmptySequence { .. } => "CONFIG_EMPTY_SEQUENCE",
            Self::Grammar { .. } => "CONFIG_GRAMMAR",
            Self::NotValidated { .. } => "CONFIG_NOT_VALIDATED",
        }
    }
}

// ============================================================================
// Cast Rejections
// ============================================================================

/// Why a cast request was refused before anything happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastRejection {
    /// No instance is registered under the given handle.
    #[error("unknown skill instance")]
    UnknownInstance,

    /// The instance is still cooling down.
    #[error("skill is on cooldown")]
    OnCooldown,

    /// The instance is already casting.
    #[error("skill is already casting")]
    Casting,

    /// Passive skills are never cast.
    #[error("passive skills cannot be cast")]
    Passive,

    /// The bound skill never passed validation.
    #[error("skill has not passed validation")]
    NotValidated,

    /// The owner no longer exists in the world.
    #[error("owner is not available")]
    OwnerUnavailable,

    /// The explicit target no longer exists in the world.
    #[error("target is not available")]
    InvalidTarget,

    /// The instance level is below the skill's requirement.
    #[error("requires level {required}, instance is level {actual}")]
    LevelTooLow { required: u32, actual: u32 },

    /// The explicit target is beyond the skill's range.
    #[error("target is out of range")]
    OutOfRange,

    /// The owner cannot pay the resource cost.
    #[error("not enough {0}")]
    InsufficientResource(ResourceKind),
}

impl SkillError for CastRejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownInstance | Self::NotValidated => ErrorSeverity::Validation,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownInstance => "CAST_UNKNOWN_INSTANCE",
            Self::OnCooldown => "CAST_ON_COOLDOWN",
            Self::Casting => "CAST_ALREADY_CASTING",
            Self::Passive => "CAST_PASSIVE",
            Self::NotValidated => "CAST_NOT_VALIDATED",
            Self::OwnerUnavailable => "CAST_OWNER_UNAVAILABLE",
            Self::InvalidTarget => "CAST_INVALID_TARGET",
            Self::LevelTooLow { .. } => "CAST_LEVEL_TOO_LOW",
            Self::OutOfRange => "CAST_OUT_OF_RANGE",
            Self::InsufficientResource(_) => "CAST_INSUFFICIENT_RESOURCE",
        }
    }
}
