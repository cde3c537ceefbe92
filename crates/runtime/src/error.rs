//! Error types surfaced by the runtime crate.
//!
//! Cast-time problems never show up here: they are [`CastRejection`]s at
//! request time and lifecycle events afterwards. This type covers setting the
//! executor up.
//!
//! [`CastRejection`]: skill_core::CastRejection

use skill_core::{ConfigError, ErrorSeverity, SkillError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("environment variable {key} has unparseable value {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("invalid executor configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    Skill(#[from] ConfigError),
}

impl SkillError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidEnv { .. } | Self::InvalidConfig { .. } => ErrorSeverity::Fatal,
            Self::Skill(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEnv { .. } => "RUNTIME_INVALID_ENV",
            Self::InvalidConfig { .. } => "RUNTIME_INVALID_CONFIG",
            Self::Skill(inner) => inner.error_code(),
        }
    }
}
