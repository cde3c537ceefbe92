//! Skill execution orchestrator.
//!
//! [`SkillExecutor`] owns the registered [`SkillInstance`]s and every cast in
//! flight. A host drives it with [`update`](SkillExecutor::update) once per
//! tick; outcomes come out of its [`EventBus`] and nowhere else.
//!
//! Per tick, in order:
//! 1. instances whose owner left the world are dropped (their executions fail
//!    with [`FailureReason::OwnerDestroyed`])
//! 2. every instance advances its cooldown and cast timers
//! 3. every execution ages, times out, or steps its block sequence; a cast
//!    whose instance was reset or interrupted directly is ended as
//!    [`InterruptCause::Cancelled`]

mod execution;

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skill_core::{
    CastInput, CastRejection, EntityId, ExecutionContext, ExecutionId, SkillInstance, SkillKind,
    SkillRng, World, compute_seed,
};
use tracing::{debug, info, warn};

use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::events::{CastInfo, EventBus, FailureReason, InterruptCause, SkillEvent};
use execution::{Execution, Phase, Termination};

/// Handle to an instance registered with a [`SkillExecutor`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst-{}", self.0)
    }
}

/// Drives skill instances and their executions tick by tick.
pub struct SkillExecutor {
    config: ExecutorConfig,
    instances: BTreeMap<InstanceId, SkillInstance>,
    executions: Vec<Execution>,
    events: EventBus,
    clock: f64,
    next_instance: u32,
    next_execution: u64,
}

impl SkillExecutor {
    /// Creates an executor with [`ExecutorConfig::default`].
    pub fn new() -> Self {
        Self::build(ExecutorConfig::default())
    }

    pub fn with_config(config: ExecutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ExecutorConfig) -> Self {
        Self {
            events: EventBus::with_history(config.event_history),
            config,
            instances: BTreeMap::new(),
            executions: Vec::new(),
            clock: 0.0,
            next_instance: 0,
            next_execution: 0,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Seconds of simulated time since creation.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutable bus access, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // ===== instances =====

    pub fn add_instance(&mut self, instance: SkillInstance) -> InstanceId {
        self.next_instance += 1;
        let id = InstanceId(self.next_instance);
        debug!(
            target: "runtime::executor",
            instance = %id,
            skill = instance.skill().id(),
            owner = %instance.owner(),
            level = instance.level(),
            "skill instance added"
        );
        self.instances.insert(id, instance);
        id
    }

    /// Unregisters an instance. Its executions are interrupted without refund.
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<SkillInstance> {
        let removed = self.take_executions(id);
        for mut execution in removed {
            execution.abort();
            self.publish_end(
                &execution,
                Termination::Interrupted(InterruptCause::Removed),
                false,
            );
        }
        self.instances.remove(&id)
    }

    pub fn instance(&self, id: InstanceId) -> Option<&SkillInstance> {
        self.instances.get(&id)
    }

    /// Mutable instance access (level changes, custom data, reset).
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut SkillInstance> {
        self.instances.get_mut(&id)
    }

    pub fn instances_of(
        &self,
        owner: EntityId,
    ) -> impl Iterator<Item = (InstanceId, &SkillInstance)> + '_ {
        self.instances
            .iter()
            .filter(move |(_, instance)| instance.owner() == owner)
            .map(|(id, instance)| (*id, instance))
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ===== executions =====

    /// Number of executions still in flight.
    pub fn active_executions(&self) -> usize {
        self.executions.len()
    }

    pub fn is_executing(&self, id: InstanceId) -> bool {
        self.executions.iter().any(|execution| execution.instance == id)
    }

    /// Current targets of an in-flight execution.
    pub fn execution_targets(&self, id: ExecutionId) -> Option<&[EntityId]> {
        self.executions
            .iter()
            .find(|execution| execution.id == id)
            .map(|execution| execution.context().targets())
    }

    /// Requests a cast; true if it was accepted.
    ///
    /// See [`try_execute`](Self::try_execute) for the reason behind a refusal.
    pub fn execute_skill(
        &mut self,
        instance: InstanceId,
        target: Option<EntityId>,
        input: Option<CastInput>,
        world: &mut dyn World,
    ) -> bool {
        match self.try_execute(instance, target, input, world) {
            Ok(_) => true,
            Err(reason) => {
                debug!(
                    target: "runtime::executor",
                    instance = %instance,
                    %reason,
                    "cast rejected"
                );
                false
            }
        }
    }

    /// Requests a cast.
    ///
    /// Checks, in order: the instance can cast, its skill is validated, the
    /// owner is alive, the level requirement, the explicit target (alive and
    /// in range), and finally that the owner can pay. A refusal changes
    /// nothing and publishes nothing.
    ///
    /// Once the instance checks pass, a cast phase left behind by resetting
    /// the instance directly is ended as `Cancelled` (refunded). Then the
    /// cost is paid, targets are resolved (the explicit target wins over the
    /// skill's resolver) and `Started` is published. Instant skills run their
    /// blocks before this returns.
    pub fn try_execute(
        &mut self,
        id: InstanceId,
        target: Option<EntityId>,
        input: Option<CastInput>,
        world: &mut dyn World,
    ) -> std::result::Result<ExecutionId, CastRejection> {
        let instance = self.instances.get(&id).ok_or(CastRejection::UnknownInstance)?;
        check_request(instance, target, &*world)?;
        // the instance can cast, so a tracked cast phase is stale
        self.cancel_detached_casts(id, world);
        let instance = self.instances.get(&id).ok_or(CastRejection::UnknownInstance)?;

        let owner = instance.owner();
        let level = instance.level();
        let skill = Arc::clone(instance.skill());
        let cost = instance.cost().filter(|(_, amount)| *amount > 0.0);

        if let Some((kind, amount)) = cost {
            let paid = world
                .resources(owner)
                .is_some_and(|pool| pool.spend(kind, amount));
            if !paid {
                return Err(CastRejection::InsufficientResource(kind));
            }
        }

        self.next_execution += 1;
        let execution_id = ExecutionId(self.next_execution);
        let seed = compute_seed(self.config.base_seed, execution_id.0, owner.0, id.0);
        let mut ctx = ExecutionContext::new(execution_id, owner, level, SkillRng::with_seed(seed))
            .with_input(input.unwrap_or_default())
            .with_timestamp(self.clock);
        let targets = match target {
            Some(target) => vec![target],
            None => skill.resolver().resolve(owner, &*world, ctx.rng()),
        };
        ctx.set_targets(targets);

        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(CastRejection::UnknownInstance)?;
        instance.start_casting();
        let phase = if instance.is_casting() {
            Phase::Casting
        } else {
            Phase::Running
        };

        let mut execution = Execution::new(id, skill, cost, ctx, phase);
        let targets = execution.context().targets().to_vec();
        info!(
            target: "runtime::executor",
            execution = %execution_id,
            instance = %id,
            skill = execution.skill.id(),
            owner = %owner,
            targets = targets.len(),
            casting = phase == Phase::Casting,
            "skill execution started"
        );
        self.events.publish(SkillEvent::Started {
            cast: execution.info(),
            targets,
            casting: phase == Phase::Casting,
        });

        match phase {
            Phase::Casting => self.executions.push(execution),
            Phase::Running => {
                if let Some(termination) = self.step_execution(&mut execution, world, 0.0) {
                    self.finish(&execution, termination);
                } else {
                    self.executions.push(execution);
                }
            }
        }
        Ok(execution_id)
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32, world: &mut dyn World) {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);

        let orphaned: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, instance)| !world.is_alive(instance.owner()))
            .map(|(id, _)| *id)
            .collect();
        for id in orphaned {
            self.drop_orphan(id);
        }

        let mut cast_finished = Vec::new();
        for (id, instance) in &mut self.instances {
            let report = instance.update(dt);
            if report.cooldown_finished {
                debug!(
                    target: "runtime::executor",
                    instance = %id,
                    skill = instance.skill().id(),
                    "cooldown finished"
                );
                self.events.publish(SkillEvent::CooldownFinished {
                    instance: *id,
                    skill: instance.skill().id().to_owned(),
                    owner: instance.owner(),
                });
            }
            if report.cast_finished {
                cast_finished.push(*id);
            }
        }

        let mut survivors = Vec::with_capacity(self.executions.len());
        for mut execution in mem::take(&mut self.executions) {
            execution.advance_age(dt);
            if execution.age() > self.config.safety_timeout {
                warn!(
                    target: "runtime::executor",
                    execution = %execution.id,
                    skill = execution.skill.id(),
                    age = execution.age(),
                    timeout = self.config.safety_timeout,
                    "execution exceeded safety timeout"
                );
                let refunded = self.halt(&mut execution, world);
                self.publish_end(
                    &execution,
                    Termination::Failed(FailureReason::Timeout),
                    refunded,
                );
                continue;
            }

            let step_dt = match execution.phase() {
                Phase::Running => dt,
                Phase::Casting if cast_finished.contains(&execution.instance) => {
                    execution.begin_blocks();
                    0.0
                }
                Phase::Casting if !self.is_cast_pending(&execution) => {
                    let refunded = self.halt(&mut execution, world);
                    self.publish_end(
                        &execution,
                        Termination::Interrupted(InterruptCause::Cancelled),
                        refunded,
                    );
                    continue;
                }
                Phase::Casting => {
                    survivors.push(execution);
                    continue;
                }
            };

            match self.step_execution(&mut execution, world, step_dt) {
                Some(termination) => self.finish(&execution, termination),
                None => survivors.push(execution),
            }
        }
        self.executions = survivors;
    }

    /// Interrupts every execution of `id`. During the cast phase the cost is
    /// refunded and no cooldown is charged. Returns false if nothing ran.
    pub fn interrupt_skill(&mut self, id: InstanceId, world: &mut dyn World) -> bool {
        let interrupted = self.take_executions(id);
        if interrupted.is_empty() {
            return false;
        }
        for mut execution in interrupted {
            let refunded = self.halt(&mut execution, world);
            self.publish_end(
                &execution,
                Termination::Interrupted(InterruptCause::Requested),
                refunded,
            );
        }
        true
    }

    /// Interrupts everything in flight. Returns how many executions stopped.
    pub fn stop_all_skills(&mut self, world: &mut dyn World) -> usize {
        let stopped = mem::take(&mut self.executions);
        let count = stopped.len();
        for mut execution in stopped {
            let refunded = self.halt(&mut execution, world);
            self.publish_end(
                &execution,
                Termination::Interrupted(InterruptCause::Stopped),
                refunded,
            );
        }
        if count > 0 {
            info!(target: "runtime::executor", count, "stopped all skill executions");
        }
        count
    }

    // ===== internals =====

    fn take_executions(&mut self, id: InstanceId) -> Vec<Execution> {
        let (taken, kept) = mem::take(&mut self.executions)
            .into_iter()
            .partition(|execution| execution.instance == id);
        self.executions = kept;
        taken
    }

    /// True while the instance still tracks the cast this execution waits on.
    fn is_cast_pending(&self, execution: &Execution) -> bool {
        self.instances
            .get(&execution.instance)
            .is_some_and(SkillInstance::is_casting)
    }

    /// Ends cast-phase executions of `id` whose instance is no longer casting.
    fn cancel_detached_casts(&mut self, id: InstanceId, world: &mut dyn World) {
        if self.instances.get(&id).is_none_or(SkillInstance::is_casting) {
            return;
        }
        let (detached, kept): (Vec<Execution>, Vec<Execution>) =
            mem::take(&mut self.executions)
                .into_iter()
                .partition(|execution| {
                    execution.instance == id && execution.phase() == Phase::Casting
                });
        self.executions = kept;
        for mut execution in detached {
            debug!(
                target: "runtime::executor",
                execution = %execution.id,
                instance = %id,
                "cast cancelled outside the executor"
            );
            let refunded = self.halt(&mut execution, world);
            self.publish_end(
                &execution,
                Termination::Interrupted(InterruptCause::Cancelled),
                refunded,
            );
        }
    }

    fn drop_orphan(&mut self, id: InstanceId) {
        for mut execution in self.take_executions(id) {
            execution.abort();
            self.publish_end(
                &execution,
                Termination::Failed(FailureReason::OwnerDestroyed),
                false,
            );
        }
        if let Some(instance) = self.instances.remove(&id) {
            debug!(
                target: "runtime::executor",
                instance = %id,
                skill = instance.skill().id(),
                owner = %instance.owner(),
                "owner gone, instance dropped"
            );
        }
    }

    /// Steps the block sequence; `Some` once the execution is over.
    fn step_execution(
        &mut self,
        execution: &mut Execution,
        world: &mut dyn World,
        dt: f32,
    ) -> Option<Termination> {
        let report = execution.step(world, dt);
        for skipped in &report.skipped {
            debug!(
                target: "runtime::executor",
                execution = %execution.id,
                index = skipped.index,
                block = %skipped.block,
                reason = ?skipped.reason,
                "block skipped"
            );
        }
        Termination::from_run(report.state)
    }

    /// Aborts a live execution, undoing the cast phase if it is still in it.
    /// Returns true if the cost was refunded.
    fn halt(&mut self, execution: &mut Execution, world: &mut dyn World) -> bool {
        let mut refunded = false;
        if execution.is_refundable() {
            if let Some(instance) = self.instances.get_mut(&execution.instance) {
                instance.interrupt_cast();
            }
            if let Some((kind, amount)) = execution.cost
                && let Some(pool) = world.resources(execution.owner)
            {
                pool.refund(kind, amount);
                refunded = true;
            }
        }
        execution.abort();
        refunded
    }

    /// Applies a run's own outcome to its instance and publishes it.
    fn finish(&mut self, execution: &Execution, termination: Termination) {
        if let Some(instance) = self.instances.get_mut(&execution.instance) {
            match &termination {
                Termination::Completed if execution.skill.kind() == SkillKind::Toggle => {
                    instance.toggle_active();
                }
                Termination::Interrupted(_) => {
                    instance.interrupt_cast();
                }
                _ => {}
            }
        }
        self.publish_end(execution, termination, false);
    }

    fn publish_end(&mut self, execution: &Execution, termination: Termination, refunded: bool) {
        let cast: CastInfo = execution.info();
        let event = match termination {
            Termination::Completed => {
                info!(
                    target: "runtime::executor",
                    execution = %cast.execution,
                    skill = %cast.skill,
                    "skill execution completed"
                );
                SkillEvent::Completed { cast }
            }
            Termination::Failed(reason) => {
                warn!(
                    target: "runtime::executor",
                    execution = %cast.execution,
                    skill = %cast.skill,
                    reason = ?reason,
                    "skill execution failed"
                );
                SkillEvent::Failed { cast, reason }
            }
            Termination::Interrupted(cause) => {
                info!(
                    target: "runtime::executor",
                    execution = %cast.execution,
                    skill = %cast.skill,
                    cause = ?cause,
                    refunded,
                    "skill execution interrupted"
                );
                SkillEvent::Interrupted {
                    cast,
                    cause,
                    refunded,
                }
            }
        };
        self.events.publish(event);
    }
}

impl Default for SkillExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SkillExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkillExecutor")
            .field("config", &self.config)
            .field("instances", &self.instances.len())
            .field("executions", &self.executions.len())
            .field("clock", &self.clock)
            .finish()
    }
}

fn check_request(
    instance: &SkillInstance,
    target: Option<EntityId>,
    world: &dyn World,
) -> std::result::Result<(), CastRejection> {
    instance.check_cast()?;

    let skill = instance.skill();
    if !skill.is_validated() {
        return Err(CastRejection::NotValidated);
    }

    let owner = instance.owner();
    if !world.is_alive(owner) {
        return Err(CastRejection::OwnerUnavailable);
    }

    if instance.level() < skill.required_level() {
        return Err(CastRejection::LevelTooLow {
            required: skill.required_level(),
            actual: instance.level(),
        });
    }

    if let Some(target) = target {
        if !world.is_alive(target) {
            return Err(CastRejection::InvalidTarget);
        }
        if let Some(range) = skill.range() {
            let distance = world
                .distance(owner, target)
                .ok_or(CastRejection::InvalidTarget)?;
            if distance > range {
                return Err(CastRejection::OutOfRange);
            }
        }
    }

    Ok(())
}
