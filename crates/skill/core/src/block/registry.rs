//! Block registry: string id to factory.
//!
//! Skills can be authored as data (`BlockSpec`s) and turned into block
//! instances here. New block kinds are added with [`BlockRegistry::register`];
//! nothing else in the crate needs to change.

use std::collections::HashMap;
use std::sync::Arc;

use crate::block::composite::{
    ChainBlock, ConditionalBlock, DelayedBlock, ForEachTargetBlock, Predicate, RepeatedBlock,
};
use crate::block::leaf::{
    CritRoll, DamageBlock, HealBlock, SetVariableBlock, StatusBlock, TeleportBlock, TeleportMode,
};
use crate::block::params::{BlockParams, BlockSpec, ParamValue};
use crate::block::BlockRef;
use crate::capability::DamageKind;
use crate::context::Value;
use crate::error::ConfigError;

/// Builds a block from its parameters. Receives the registry so composites
/// can build their nested blocks.
pub type BlockFactory =
    Arc<dyn Fn(&BlockParams, &BlockRegistry) -> Result<BlockRef, ConfigError> + Send + Sync>;

/// Lookup table of block factories.
///
/// Immutable once shared: build it, register custom kinds, then wrap it in an
/// `Arc` and hand it to every builder.
#[derive(Clone, Default)]
pub struct BlockRegistry {
    factories: HashMap<String, BlockFactory>,
}

impl BlockRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in block kind.
    ///
    /// Built-ins: `damage`, `heal`, `status`, `teleport`, `set_variable`,
    /// `conditional`, `chain`, `repeated`, `delayed`, `for_each_target`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DamageBlock::ID, build_damage);
        registry.register(HealBlock::ID, build_heal);
        registry.register(StatusBlock::ID, build_status);
        registry.register(TeleportBlock::ID, build_teleport);
        registry.register(SetVariableBlock::ID, build_set_variable);
        registry.register(ConditionalBlock::ID, build_conditional);
        registry.register(ChainBlock::ID, build_chain);
        registry.register(RepeatedBlock::ID, build_repeated);
        registry.register(DelayedBlock::ID, build_delayed);
        registry.register(ForEachTargetBlock::ID, build_for_each);
        registry
    }

    /// Registers (or replaces) the factory for `id`. Returns true if a previous
    /// factory was replaced.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn(&BlockParams, &BlockRegistry) -> Result<BlockRef, ConfigError>
        + Send
        + Sync
        + 'static,
    ) -> bool {
        self.factories
            .insert(id.into(), Arc::new(factory))
            .is_some()
    }

    /// Instantiates and validates the block described by `spec`.
    pub fn build(&self, spec: &BlockSpec) -> Result<BlockRef, ConfigError> {
        let factory = self
            .factories
            .get(&spec.id)
            .ok_or_else(|| ConfigError::UnknownBlock {
                id: spec.id.clone(),
            })?;
        let block = factory(&spec.params, self)?;
        block.validate()?;
        Ok(block)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted (for debugging and tooling).
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl core::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

// ============================================================================
// Built-in factories
// ============================================================================

fn crit_param(id: &str, params: &BlockParams) -> Result<Option<CritRoll>, ConfigError> {
    let chance = params.float_or(id, "crit_chance", 0.0)?;
    if chance == 0.0 && !params.contains("crit_multiplier") {
        return Ok(None);
    }
    let multiplier = params.float_or(id, "crit_multiplier", CritRoll::new(chance).multiplier)?;
    Ok(Some(CritRoll::new(chance).with_multiplier(multiplier)))
}

fn count_param(id: &str, params: &BlockParams) -> Result<u32, ConfigError> {
    let count = params.int(id, "count")?;
    u32::try_from(count)
        .map_err(|_| ConfigError::invalid(id, "count", format!("{count} is out of range")))
}

fn build_damage(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = DamageBlock::ID;
    let mut block = DamageBlock::new(params.float(id, "amount")?)
        .scaling(params.float_or(id, "scaling", 0.0)?)
        .kind(params.parse_or(id, "kind", DamageKind::default())?)
        .jitter(params.bool_or(id, "jitter", false)?);
    if let Some(crit) = crit_param(id, params)? {
        block = block.crit(crit);
    }
    Ok(Arc::new(block))
}

fn build_heal(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = HealBlock::ID;
    let mut block = HealBlock::new(params.float(id, "amount")?)
        .scaling(params.float_or(id, "scaling", 0.0)?)
        .jitter(params.bool_or(id, "jitter", false)?);
    if params.bool_or(id, "can_overheal", false)? {
        block = block.overheal(params.float(id, "overheal_cap_percent")?);
    }
    if let Some(crit) = crit_param(id, params)? {
        block = block.crit(crit);
    }
    Ok(Arc::new(block))
}

fn build_status(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = StatusBlock::ID;
    let block = StatusBlock::new(params.text(id, "name")?, params.float(id, "duration")?)
        .scaling(params.float_or(id, "duration_scaling", 0.0)?);
    Ok(Arc::new(block))
}

fn build_teleport(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = TeleportBlock::ID;
    let name = params.text(id, "mode")?;
    let mode = match TeleportMode::from_name(name) {
        Some(TeleportMode::ToPosition(_)) => {
            TeleportMode::ToPosition(params.vector(id, "position")?)
        }
        Some(TeleportMode::BehindTarget { .. }) => TeleportMode::BehindTarget {
            offset: params.float_or(id, "offset", 1.0)?,
        },
        Some(TeleportMode::AwayFromTarget { .. }) => TeleportMode::AwayFromTarget {
            distance: params.float(id, "distance")?,
        },
        Some(mode) => mode,
        None => {
            return Err(ConfigError::invalid(id, "mode", format!("unknown mode `{name}`")));
        }
    };
    let block = TeleportBlock::new(mode)
        .max_distance(params.float_or(id, "max_distance", f32::INFINITY)?)
        .require_line_of_sight(params.bool_or(id, "line_of_sight", false)?);
    Ok(Arc::new(block))
}

fn build_set_variable(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = SetVariableBlock::ID;
    let key = params.text(id, "key")?;
    let value = match params.get("value") {
        Some(ParamValue::Float(v)) => Value::from(*v),
        Some(ParamValue::Int(v)) => Value::Int(*v),
        Some(ParamValue::Bool(v)) => Value::Bool(*v),
        Some(ParamValue::Text(v)) => Value::Text(v.clone()),
        Some(ParamValue::Vector(v)) => Value::Vector(*v),
        Some(_) => {
            return Err(ConfigError::invalid(id, "value", "expected a plain value"));
        }
        None => {
            return Err(ConfigError::MissingParameter {
                block: id.to_owned(),
                param: "value".to_owned(),
            });
        }
    };
    Ok(Arc::new(SetVariableBlock::new(key, value)))
}

fn build_conditional(
    params: &BlockParams,
    registry: &BlockRegistry,
) -> Result<BlockRef, ConfigError> {
    let id = ConditionalBlock::ID;
    let inner = registry.build(params.block_spec(id, "block")?)?;
    let predicate = params.predicate_or(id, "predicate", Predicate::Always)?;
    Ok(Arc::new(ConditionalBlock::new(inner, predicate)))
}

fn build_chain(params: &BlockParams, registry: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let inner = registry.build(params.block_spec(ChainBlock::ID, "block")?)?;
    Ok(Arc::new(ChainBlock::new(inner)))
}

fn build_repeated(params: &BlockParams, registry: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = RepeatedBlock::ID;
    let inner = registry.build(params.block_spec(id, "block")?)?;
    let count = count_param(id, params)?;
    let interval = params.float_or(id, "interval", 0.0)?;
    Ok(Arc::new(RepeatedBlock::new(inner, count, interval)))
}

fn build_delayed(params: &BlockParams, registry: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = DelayedBlock::ID;
    let inner = registry.build(params.block_spec(id, "block")?)?;
    Ok(Arc::new(DelayedBlock::new(inner, params.float(id, "delay")?)))
}

fn build_for_each(params: &BlockParams, _: &BlockRegistry) -> Result<BlockRef, ConfigError> {
    let id = ForEachTargetBlock::ID;
    let skill = params.skill(id, "skill")?;
    if !skill.is_validated() {
        return Err(ConfigError::NotValidated {
            skill: skill.id().to_owned(),
        });
    }
    Ok(Arc::new(ForEachTargetBlock::for_skill(skill)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockCategory};

    #[test]
    fn builds_nested_composites() {
        let registry = BlockRegistry::with_builtins();
        let spec = BlockSpec::new("repeated")
            .with("count", 3i64)
            .with("interval", 0.5f32)
            .with(
                "block",
                BlockSpec::new("damage")
                    .with("amount", 4.0f32)
                    .with("kind", "fire"),
            );

        let block = registry.build(&spec).expect("valid spec");
        assert_eq!(block.id(), "repeated");
        assert_eq!(block.category(), BlockCategory::Effect);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let registry = BlockRegistry::with_builtins();
        let err = registry.build(&BlockSpec::new("meteor")).unwrap_err();
        assert_eq!(err, ConfigError::UnknownBlock { id: "meteor".into() });
    }

    #[test]
    fn nested_errors_surface() {
        let registry = BlockRegistry::with_builtins();
        let spec = BlockSpec::new("chain").with("block", BlockSpec::new("heal"));
        assert!(matches!(
            registry.build(&spec),
            Err(ConfigError::MissingParameter { ref param, .. }) if param == "amount"
        ));
    }

    #[test]
    fn bad_enum_text_is_invalid() {
        let registry = BlockRegistry::with_builtins();
        let spec = BlockSpec::new("damage").with("amount", 1.0f32).with("kind", "shadow");
        assert!(matches!(
            registry.build(&spec),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn custom_kinds_can_be_registered() {
        let mut registry = BlockRegistry::new();
        assert!(!registry.register("nova", |params, _| {
            Ok(Arc::new(DamageBlock::new(params.float("nova", "amount")?)) as BlockRef)
        }));
        assert!(registry.contains("nova"));
        assert_eq!(registry.ids(), vec!["nova"]);
    }
}
