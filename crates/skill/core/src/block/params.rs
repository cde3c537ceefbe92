//! Authoring-time parameters for data-driven block construction.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use glam::Vec3;

use crate::block::composite::Predicate;
use crate::entity::SideMask;
use crate::error::ConfigError;
use crate::skill::Skill;

/// One authoring parameter.
#[derive(Clone, Debug)]
pub enum ParamValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Text(String),
    Vector(Vec3),
    /// A nested block, built through the same registry.
    Block(BlockSpec),
    Predicate(Predicate),
    /// A complete sub-skill, used by `for_each_target`.
    Skill(Arc<Skill>),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::Text(_) => "text",
            ParamValue::Vector(_) => "vector",
            ParamValue::Block(_) => "block",
            ParamValue::Predicate(_) => "predicate",
            ParamValue::Skill(_) => "skill",
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        ParamValue::Vector(v)
    }
}

impl From<BlockSpec> for ParamValue {
    fn from(v: BlockSpec) -> Self {
        ParamValue::Block(v)
    }
}

impl From<Predicate> for ParamValue {
    fn from(v: Predicate) -> Self {
        ParamValue::Predicate(v)
    }
}

impl From<Arc<Skill>> for ParamValue {
    fn from(v: Arc<Skill>) -> Self {
        ParamValue::Skill(v)
    }
}

/// Named parameters of a block descriptor.
///
/// Accessors take the owning block id so errors point at the right block.
#[derive(Clone, Debug, Default)]
pub struct BlockParams {
    values: BTreeMap<String, ParamValue>,
}

impl BlockParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    fn require(&self, block: &str, key: &str) -> Result<&ParamValue, ConfigError> {
        self.values
            .get(key)
            .ok_or_else(|| ConfigError::MissingParameter {
                block: block.to_owned(),
                param: key.to_owned(),
            })
    }

    fn mismatch(block: &str, key: &str, expected: &str, found: &ParamValue) -> ConfigError {
        ConfigError::invalid(
            block,
            key,
            format!("expected {expected}, found {}", found.kind()),
        )
    }

    /// Required float. Integers are accepted and widened.
    pub fn float(&self, block: &str, key: &str) -> Result<f32, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f32),
            other => Err(Self::mismatch(block, key, "float", other)),
        }
    }

    pub fn float_or(&self, block: &str, key: &str, default: f32) -> Result<f32, ConfigError> {
        if self.contains(key) {
            self.float(block, key)
        } else {
            Ok(default)
        }
    }

    pub fn int(&self, block: &str, key: &str) -> Result<i64, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(block, key, "int", other)),
        }
    }

    pub fn int_or(&self, block: &str, key: &str, default: i64) -> Result<i64, ConfigError> {
        if self.contains(key) {
            self.int(block, key)
        } else {
            Ok(default)
        }
    }

    pub fn bool_or(&self, block: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(other) => Err(Self::mismatch(block, key, "bool", other)),
        }
    }

    pub fn text(&self, block: &str, key: &str) -> Result<&str, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Text(v) => Ok(v),
            other => Err(Self::mismatch(block, key, "text", other)),
        }
    }

    pub fn vector(&self, block: &str, key: &str) -> Result<Vec3, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Vector(v) => Ok(*v),
            other => Err(Self::mismatch(block, key, "vector", other)),
        }
    }

    pub fn block_spec(&self, block: &str, key: &str) -> Result<&BlockSpec, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Block(v) => Ok(v),
            other => Err(Self::mismatch(block, key, "block", other)),
        }
    }

    pub fn predicate_or(
        &self,
        block: &str,
        key: &str,
        default: Predicate,
    ) -> Result<Predicate, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(ParamValue::Predicate(v)) => Ok(v.clone()),
            Some(other) => Err(Self::mismatch(block, key, "predicate", other)),
        }
    }

    pub fn skill(&self, block: &str, key: &str) -> Result<Arc<Skill>, ConfigError> {
        match self.require(block, key)? {
            ParamValue::Skill(v) => Ok(Arc::clone(v)),
            other => Err(Self::mismatch(block, key, "skill", other)),
        }
    }

    /// Optional text parameter parsed through `FromStr` (strum enums, ...).
    pub fn parse_or<T: FromStr>(
        &self,
        block: &str,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        if !self.contains(key) {
            return Ok(default);
        }
        let raw = self.text(block, key)?;
        raw.parse()
            .map_err(|_| ConfigError::invalid(block, key, format!("unrecognized value `{raw}`")))
    }

    /// Side mask given as `"enemies"`, `"allies|self"`, `"all"`, ...
    pub fn sides_or(
        &self,
        block: &str,
        key: &str,
        default: SideMask,
    ) -> Result<SideMask, ConfigError> {
        if !self.contains(key) {
            return Ok(default);
        }
        let raw = self.text(block, key)?;
        let mut mask = SideMask::empty();
        for part in raw.split('|').map(str::trim) {
            let flag = SideMask::from_name(&part.to_ascii_uppercase()).ok_or_else(|| {
                ConfigError::invalid(block, key, format!("unknown side `{part}`"))
            })?;
            mask |= flag;
        }
        Ok(mask)
    }
}

/// Data description of a block: a registry id plus its parameters.
#[derive(Clone, Debug)]
pub struct BlockSpec {
    pub id: String,
    pub params: BlockParams,
}

impl BlockSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: BlockParams::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_widens_to_float() {
        let params = BlockParams::new().with("amount", 10i64);
        assert_eq!(params.float("damage", "amount"), Ok(10.0));
    }

    #[test]
    fn missing_and_mistyped_are_reported() {
        let params = BlockParams::new().with("amount", "ten");
        assert!(matches!(
            params.float("damage", "scaling"),
            Err(ConfigError::MissingParameter { .. })
        ));
        assert!(matches!(
            params.float("damage", "amount"),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn sides_parse_case_insensitively() {
        let params = BlockParams::new().with("sides", "allies|Self");
        assert_eq!(
            params.sides_or("radius", "sides", SideMask::ENEMIES),
            Ok(SideMask::ALLIES | SideMask::SELF)
        );
        let bad = BlockParams::new().with("sides", "neutral");
        assert!(bad.sides_or("radius", "sides", SideMask::ALL).is_err());
    }
}
