//! Per-execution state shared by every block of one cast.
//!
//! An [`ExecutionContext`] is created when a cast is accepted and dropped when
//! the execution ends. Blocks are stateless; anything that must survive between
//! blocks (variables, the RNG, deferred composite progress) lives here.

mod rng;
mod value;

use std::collections::HashMap;

use glam::Vec3;

pub use rng::{SkillRng, compute_seed};
pub use value::{FromValue, Value};

use crate::block::BlockStatus;
use crate::block::composite::CompositeState;
use crate::capability::World;
use crate::entity::EntityId;

/// Well-known variable keys read and written by the built-in blocks.
pub mod keys {
    /// Float multiplier applied to damage output. Defaults to 1.0.
    pub const DAMAGE_MULTIPLIER: &str = "damage.multiplier";
    /// Float total damage applied by the last damage block.
    pub const DAMAGE_TOTAL: &str = "damage.total";
    /// Bool set when the last damage roll was a critical hit.
    pub const DAMAGE_CRITICAL: &str = "damage.critical";
    /// Float multiplier applied to heal output. Defaults to 1.0.
    pub const HEAL_MULTIPLIER: &str = "heal.multiplier";
    /// Float total healing applied by the last heal block.
    pub const HEAL_TOTAL: &str = "heal.total";
    /// Bool set when the last heal roll was a critical.
    pub const HEAL_CRITICAL: &str = "heal.critical";
    /// Int number of targets that accepted the last status.
    pub const STATUS_APPLIED: &str = "status.applied";
    /// Vector destination of the last teleport.
    pub const TELEPORT_DESTINATION: &str = "teleport.destination";
}

/// Identifier of one accepted cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionId(pub u64);

impl core::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}

/// Caller-supplied input captured at cast time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CastInput {
    /// Ground point for aimed skills (used by `ToAimPoint` teleports).
    pub aim_point: Option<Vec3>,
    /// Variables copied into the context before the first block runs.
    pub variables: Vec<(String, Value)>,
}

impl CastInput {
    pub fn aimed_at(point: Vec3) -> Self {
        Self {
            aim_point: Some(point),
            variables: Vec::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.push((key.into(), value.into()));
        self
    }
}

/// Slot for deferred composite progress: (entry index, composite depth).
type ResumeKey = (usize, u32);

/// Mutable state of one execution.
#[derive(Debug)]
pub struct ExecutionContext {
    id: ExecutionId,
    source: EntityId,
    targets: Vec<EntityId>,
    level: u32,
    variables: HashMap<String, Value>,
    rng: SkillRng,
    started_at: f64,
    input: CastInput,
    delta_time: f32,
    previous_status: Option<BlockStatus>,
    entry: usize,
    depth: u32,
    nesting: u32,
    resume: HashMap<ResumeKey, CompositeState>,
}

impl ExecutionContext {
    pub fn new(id: ExecutionId, source: EntityId, level: u32, rng: SkillRng) -> Self {
        Self {
            id,
            source,
            targets: Vec::new(),
            level,
            variables: HashMap::new(),
            rng,
            started_at: 0.0,
            input: CastInput::default(),
            delta_time: 0.0,
            previous_status: None,
            entry: 0,
            depth: 0,
            nesting: 0,
            resume: HashMap::new(),
        }
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = EntityId>) -> Self {
        self.set_targets(targets);
        self
    }

    /// Installs the cast input and copies its variables into the store.
    pub fn with_input(mut self, input: CastInput) -> Self {
        for (key, value) in &input.variables {
            self.variables.insert(key.clone(), value.clone());
        }
        self.input = input;
        self
    }

    pub fn with_timestamp(mut self, started_at: f64) -> Self {
        self.started_at = started_at;
        self
    }

    /// Builds an isolated context for a sub-skill run on behalf of this one.
    ///
    /// The child shares the execution id and level, gets a fresh variable
    /// store, and draws its RNG seed from this context's stream.
    pub fn spawn_nested(&mut self, source: EntityId) -> Self {
        let rng = self.rng.fork();
        let mut child = Self::new(self.id, source, self.level, rng).with_timestamp(self.started_at);
        child.input = self.input.clone();
        child.nesting = self.nesting + 1;
        child
    }

    // ===== identity =====

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn source(&self) -> EntityId {
        self.source
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn input(&self) -> &CastInput {
        &self.input
    }

    /// How many `ForEachTarget` levels sit above this context.
    pub fn nesting_depth(&self) -> u32 {
        self.nesting
    }

    // ===== targets =====

    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    /// Replaces the target list, dropping duplicates while keeping order.
    pub fn set_targets(&mut self, targets: impl IntoIterator<Item = EntityId>) {
        self.targets.clear();
        for target in targets {
            self.add_target(target);
        }
    }

    pub fn add_target(&mut self, target: EntityId) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn remove_target(&mut self, target: EntityId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| *t != target);
        self.targets.len() != before
    }

    /// Drops targets that no longer exist. Returns how many were removed.
    pub fn prune_targets(&mut self, world: &dyn World) -> usize {
        let before = self.targets.len();
        self.targets.retain(|t| world.is_alive(*t));
        before - self.targets.len()
    }

    // ===== variables =====

    /// Reads `key` as `T`, falling back to `default` on a miss or type mismatch.
    pub fn get<T: FromValue>(&self, key: &str, default: T) -> T {
        self.try_get(key).unwrap_or(default)
    }

    pub fn try_get<T: FromValue>(&self, key: &str) -> Option<T> {
        self.variables.get(key).and_then(T::from_value)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.variables.remove(key)
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    // ===== randomness =====

    pub fn rng(&mut self) -> &mut SkillRng {
        &mut self.rng
    }

    // ===== stepping =====

    /// Seconds of the current tick left to the running block.
    ///
    /// A resumed block sees the whole tick. A block that starts partway
    /// through a tick sees only the remainder, which it counts as time
    /// already spent since it began.
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.delta_time = delta_time.max(0.0);
    }

    /// Runs `f` with `delta_time` seconds of the tick left, then restores the
    /// previous budget.
    pub(crate) fn with_delta_time<R>(
        &mut self,
        delta_time: f32,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = self.delta_time;
        self.set_delta_time(delta_time);
        let result = f(self);
        self.delta_time = saved;
        result
    }

    /// Status of the entry that ran before the current one.
    pub fn previous_status(&self) -> Option<BlockStatus> {
        self.previous_status
    }

    pub(crate) fn set_previous_status(&mut self, status: Option<BlockStatus>) {
        self.previous_status = status;
    }

    /// Index of the entry currently executing.
    pub fn current_entry(&self) -> usize {
        self.entry
    }

    pub(crate) fn set_current_entry(&mut self, entry: usize) {
        self.entry = entry;
        self.depth = 0;
    }

    /// Runs `f` one composite level deeper, so wrapped composites get their
    /// own resume slot.
    pub(crate) fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn take_resume(&mut self) -> Option<CompositeState> {
        self.resume.remove(&(self.entry, self.depth))
    }

    pub(crate) fn store_resume(&mut self, state: CompositeState) {
        self.resume.insert((self.entry, self.depth), state);
    }

    /// Returns true if some composite of the current entry has deferred work.
    pub fn has_pending_work(&self) -> bool {
        self.resume.keys().any(|(entry, _)| *entry == self.entry)
    }

    /// Discards all deferred composite progress.
    pub fn clear_resume(&mut self) {
        self.resume.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(ExecutionId(1), EntityId(0), 1, SkillRng::with_seed(0))
    }

    #[test]
    fn typed_get_falls_back_on_mismatch() {
        let mut ctx = ctx();
        ctx.set("flag", true);
        assert_eq!(ctx.get("flag", 2.5f32), 2.5);
        assert!(ctx.get("flag", false));
        assert_eq!(ctx.get("missing", 7i64), 7);
    }

    #[test]
    fn int_reads_as_float_but_not_back() {
        let mut ctx = ctx();
        ctx.set("n", 3i64);
        ctx.set("x", 1.5f64);
        assert_eq!(ctx.get("n", 0.0f64), 3.0);
        assert_eq!(ctx.get("x", 0i64), 0);
    }

    #[test]
    fn last_write_wins() {
        let mut ctx = ctx();
        ctx.set("k", 1i64);
        ctx.set("k", "text");
        assert_eq!(ctx.get("k", String::new()), "text");
        assert_eq!(ctx.remove("k"), Some(Value::Text("text".into())));
        assert!(!ctx.contains("k"));
    }

    #[test]
    fn targets_are_deduplicated() {
        let ctx = ctx().with_targets([EntityId(2), EntityId(3), EntityId(2)]);
        assert_eq!(ctx.targets(), &[EntityId(2), EntityId(3)]);
    }

    #[test]
    fn input_variables_seed_the_store() {
        let input = CastInput::default().with_variable(keys::DAMAGE_MULTIPLIER, 2.0f32);
        let ctx = ctx().with_input(input);
        assert_eq!(ctx.get(keys::DAMAGE_MULTIPLIER, 1.0f32), 2.0);
    }

    #[test]
    fn nested_context_is_isolated() {
        let mut parent = ctx();
        parent.set("k", 1i64);
        let child = parent.spawn_nested(EntityId(5));
        assert_eq!(child.source(), EntityId(5));
        assert!(!child.contains("k"));
        assert_eq!(child.nesting_depth(), 1);
        assert_eq!(child.id(), parent.id());
    }
}
