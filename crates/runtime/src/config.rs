//! Executor configuration structures and loaders.
use std::env;
use std::str::FromStr;

use crate::error::{Result, RuntimeError};

pub const SAFETY_TIMEOUT_ENV: &str = "SKILL_SAFETY_TIMEOUT";
pub const BASE_SEED_ENV: &str = "SKILL_BASE_SEED";
pub const EVENT_HISTORY_ENV: &str = "SKILL_EVENT_HISTORY";

/// Knobs of a [`SkillExecutor`](crate::SkillExecutor).
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutorConfig {
    /// Seconds an execution may live before it is force-interrupted.
    pub safety_timeout: f32,
    /// Mixed into every execution seed; same seed, same rolls.
    pub base_seed: u64,
    /// Number of published events the bus keeps for inspection. 0 disables.
    pub event_history: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            safety_timeout: 30.0,
            base_seed: 0,
            event_history: 256,
        }
    }
}

impl ExecutorConfig {
    pub fn with_safety_timeout(mut self, seconds: f32) -> Self {
        self.safety_timeout = seconds;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_event_history(mut self, capacity: usize) -> Self {
        self.event_history = capacity;
        self
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SKILL_SAFETY_TIMEOUT` - Execution timeout in seconds (default: 30)
    /// - `SKILL_BASE_SEED` - Base RNG seed (default: 0)
    /// - `SKILL_EVENT_HISTORY` - Retained event count (default: 256)
    ///
    /// Unset variables keep their defaults; set but unparseable ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary key source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(timeout) = read_var::<f32>(&lookup, SAFETY_TIMEOUT_ENV)? {
            config.safety_timeout = timeout;
        }
        if let Some(seed) = read_var::<u64>(&lookup, BASE_SEED_ENV)? {
            config.base_seed = seed;
        }
        if let Some(capacity) = read_var::<usize>(&lookup, EVENT_HISTORY_ENV)? {
            config.event_history = capacity;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.safety_timeout.is_finite() || self.safety_timeout <= 0.0 {
            return Err(RuntimeError::InvalidConfig {
                field: "safety_timeout",
                reason: "must be a positive number of seconds",
            });
        }
        Ok(())
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>>
where
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RuntimeError::InvalidEnv { key, value: raw }),
        None => Ok(None),
    }
}
