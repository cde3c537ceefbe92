//! End-to-end tests driving the executor against an in-memory arena.

use std::sync::{Arc, Mutex};

use skill_core::{
    ArenaWorld, Block, BlockCategory, BlockRegistry, BlockSpec, BlockStatus, CastRejection,
    CastState, EntityId, EntitySpec, ExecutionContext, Faction, ForEachTargetBlock, ResourceKind,
    ResourcePool, SideMask, Skill, SkillBuilder, SkillInstance, SkillKind, TargetResolver, Vec3,
    World,
};
use skill_runtime::{
    ExecutorConfig, FailureReason, InstanceId, InterruptCause, SkillEvent, SkillExecutor, Topic,
};

struct Arena {
    world: ArenaWorld,
    caster: EntityId,
    enemy: EntityId,
}

fn arena() -> Arena {
    let mut world = ArenaWorld::new();
    let caster = world.spawn(
        EntitySpec::new(Vec3::ZERO, Faction(1)).resource(ResourceKind::Mana, 50.0),
    );
    let enemy = world.spawn(EntitySpec::new(Vec3::new(3.0, 0.0, 0.0), Faction(2)));
    Arena {
        world,
        caster,
        enemy,
    }
}

fn build(builder: SkillBuilder) -> Arc<Skill> {
    Arc::new(
        builder
            .build(&BlockRegistry::with_builtins())
            .expect("valid skill"),
    )
}

fn damage(amount: f32) -> BlockSpec {
    BlockSpec::new("damage").with("amount", amount)
}

fn bolt() -> SkillBuilder {
    SkillBuilder::new("bolt").block(damage(10.0)).cooldown(2.0)
}

fn labels(executor: &SkillExecutor) -> Vec<&'static str> {
    executor.events().history().map(SkillEvent::label).collect()
}

fn mana(arena: &Arena) -> f32 {
    arena
        .world
        .entity(arena.caster)
        .expect("caster")
        .resources
        .available(ResourceKind::Mana)
}

fn add(executor: &mut SkillExecutor, arena: &Arena, skill: Arc<Skill>) -> InstanceId {
    executor.add_instance(SkillInstance::new(arena.caster, skill, 1))
}

#[test]
fn instant_skill_completes_within_the_call() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt()));

    assert!(executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world));

    assert_eq!(labels(&executor), vec!["started", "completed"]);
    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(executor.active_executions(), 0);
    let instance = executor.instance(id).expect("instance");
    assert!(instance.is_on_cooldown());
    assert!(!instance.can_cast());
}

#[test]
fn cooldown_finishes_once() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt()));
    let finished = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&finished);
    executor
        .events_mut()
        .subscribe(Topic::Cooldown, move |_| *counter.lock().unwrap() += 1);

    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    executor.update(1.0, &mut arena.world);
    assert!(executor.instance(id).unwrap().is_on_cooldown());
    executor.update(1.0, &mut arena.world);
    executor.update(1.0, &mut arena.world);

    assert!(!executor.instance(id).unwrap().is_on_cooldown());
    assert_eq!(*finished.lock().unwrap(), 1);
}

#[test]
fn rejection_on_cooldown_changes_nothing() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt()));
    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    executor.events_mut().clear_history();

    let result = executor.try_execute(id, Some(arena.enemy), None, &mut arena.world);

    assert_eq!(result, Err(CastRejection::OnCooldown));
    assert_eq!(executor.events().history().count(), 0);
    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(executor.instance(id).unwrap().cooldown_remaining(), 2.0);
}

#[test]
fn unknown_instance_is_rejected() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    assert_eq!(
        executor.try_execute(InstanceId(99), None, None, &mut arena.world),
        Err(CastRejection::UnknownInstance)
    );
}

#[test]
fn cast_time_defers_the_blocks() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt().cast_time(1.0)));

    assert!(executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world));
    assert!(executor.instance(id).unwrap().is_casting());
    assert_eq!(arena.world.health(arena.enemy), Some(100.0));

    executor.update(0.5, &mut arena.world);
    assert_eq!(arena.world.health(arena.enemy), Some(100.0));
    assert_eq!(executor.instance(id).unwrap().cast_progress(), 0.5);

    executor.update(0.5, &mut arena.world);
    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(labels(&executor), vec!["started", "completed"]);
    assert!(executor.instance(id).unwrap().is_on_cooldown());
}

#[test]
fn interrupt_during_cast_refunds_cost() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let skill = build(bolt().cast_time(2.0).cost(ResourceKind::Mana, 20.0));
    let id = add(&mut executor, &arena, skill);

    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    assert_eq!(mana(&arena), 30.0);

    assert!(executor.interrupt_skill(id, &mut arena.world));
    assert!(!executor.interrupt_skill(id, &mut arena.world));

    assert_eq!(mana(&arena), 50.0);
    let instance = executor.instance(id).unwrap();
    assert!(!instance.is_casting());
    assert!(!instance.is_on_cooldown());
    let last = executor.events().history().last().cloned();
    assert!(matches!(
        last,
        Some(SkillEvent::Interrupted {
            cause: InterruptCause::Requested,
            refunded: true,
            ..
        })
    ));
}

#[test]
fn cast_reset_on_the_instance_is_not_resumed() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let skill = build(bolt().cast_time(1.0).cost(ResourceKind::Mana, 20.0));
    let id = add(&mut executor, &arena, skill);

    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    executor.instance_mut(id).unwrap().reset();
    executor.update(0.5, &mut arena.world);

    assert_eq!(executor.active_executions(), 0);
    assert_eq!(mana(&arena), 50.0);
    assert!(matches!(
        executor.events().history().last(),
        Some(SkillEvent::Interrupted {
            cause: InterruptCause::Cancelled,
            refunded: true,
            ..
        })
    ));

    assert!(executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world));
    executor.update(1.0, &mut arena.world);

    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(
        labels(&executor),
        vec!["started", "interrupted", "started", "completed"]
    );
}

#[test]
fn recast_after_instance_interrupt_replaces_the_stale_cast() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let skill = build(bolt().cast_time(1.0).cost(ResourceKind::Mana, 20.0));
    let id = add(&mut executor, &arena, skill);

    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    assert!(executor.instance_mut(id).unwrap().interrupt_cast());
    assert!(executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world));

    assert_eq!(executor.active_executions(), 1);
    assert_eq!(mana(&arena), 30.0);
    executor.update(1.0, &mut arena.world);

    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(
        labels(&executor),
        vec!["started", "interrupted", "started", "completed"]
    );
}

#[test]
fn unaffordable_cost_is_rejected() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt().cost(ResourceKind::Mana, 80.0)));

    assert_eq!(
        executor.try_execute(id, Some(arena.enemy), None, &mut arena.world),
        Err(CastRejection::InsufficientResource(ResourceKind::Mana))
    );
    assert_eq!(mana(&arena), 50.0);
    assert_eq!(executor.events().history().count(), 0);
}

#[test]
fn range_and_level_are_checked() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let short = add(&mut executor, &arena, build(bolt().range(2.0)));
    let gated = add(&mut executor, &arena, build(bolt().required_level(5)));

    assert_eq!(
        executor.try_execute(short, Some(arena.enemy), None, &mut arena.world),
        Err(CastRejection::OutOfRange)
    );
    assert_eq!(
        executor.try_execute(gated, Some(arena.enemy), None, &mut arena.world),
        Err(CastRejection::LevelTooLow {
            required: 5,
            actual: 1
        })
    );

    executor.instance_mut(gated).unwrap().set_level(5);
    assert!(executor.execute_skill(gated, Some(arena.enemy), None, &mut arena.world));
}

#[test]
fn dead_target_is_rejected() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt()));
    arena.world.despawn(arena.enemy);

    assert_eq!(
        executor.try_execute(id, Some(arena.enemy), None, &mut arena.world),
        Err(CastRejection::InvalidTarget)
    );
}

#[test]
fn safety_timeout_fails_runaway_executions() {
    let mut arena = arena();
    let config = ExecutorConfig::default().with_safety_timeout(1.0);
    let mut executor = SkillExecutor::with_config(config).expect("valid config");
    let skill = build(
        SkillBuilder::new("barrage")
            .block(
                BlockSpec::new("repeated")
                    .with("block", damage(1.0))
                    .with("count", 10i64)
                    .with("interval", 0.5f32),
            )
            .targeting(TargetResolver::single(arena.enemy)),
    );
    let id = add(&mut executor, &arena, skill);

    executor.execute_skill(id, None, None, &mut arena.world);
    executor.update(0.5, &mut arena.world);
    executor.update(0.5, &mut arena.world);
    assert_eq!(executor.active_executions(), 1);
    executor.update(0.5, &mut arena.world);

    assert_eq!(executor.active_executions(), 0);
    assert_eq!(labels(&executor), vec!["started", "failed"]);
    assert!(matches!(
        executor.events().history().last(),
        Some(SkillEvent::Failed {
            reason: FailureReason::Timeout,
            ..
        })
    ));
    // three repetitions landed before the timeout: at 0.0, 0.5 and 1.0
    assert_eq!(arena.world.health(arena.enemy), Some(97.0));
}

#[test]
fn for_each_target_runs_one_isolated_subskill_per_target() {
    let mut arena = arena();
    let others = [
        arena
            .world
            .spawn(EntitySpec::new(Vec3::new(-3.0, 0.0, 0.0), Faction(2))),
        arena
            .world
            .spawn(EntitySpec::new(Vec3::new(0.0, 0.0, 3.0), Faction(2))),
    ];
    let backlash = build(
        SkillBuilder::new("backlash")
            .block(damage(5.0))
            .targeting(TargetResolver::caster()),
    );
    let skill = build(
        SkillBuilder::new("detonate")
            .block(
                BlockSpec::new("status")
                    .with("name", "marked")
                    .with("duration", 4.0f32),
            )
            .block_ref(Arc::new(ForEachTargetBlock::for_skill(backlash)))
            .targeting(TargetResolver::radius(10.0, SideMask::ENEMIES)),
    );
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, skill);

    assert!(executor.execute_skill(id, None, None, &mut arena.world));

    for enemy in [arena.enemy, others[0], others[1]] {
        assert_eq!(arena.world.health(enemy), Some(95.0));
        assert!(arena.world.entity(enemy).unwrap().statuses.has("marked"));
    }
    assert_eq!(arena.world.health(arena.caster), Some(100.0));
    assert_eq!(labels(&executor), vec!["started", "completed"]);
}

#[test]
fn optional_failure_does_not_abort() {
    let mut world = ArenaWorld::new();
    let caster = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
    let enemy = world.spawn(EntitySpec::new(Vec3::X, Faction(2)).immune_to("stun"));
    let skill = build(
        SkillBuilder::new("bash")
            .block(
                BlockSpec::new("status")
                    .with("name", "stun")
                    .with("duration", 1.0f32),
            )
            .optional()
            .block(damage(10.0)),
    );
    let mut executor = SkillExecutor::new();
    let id = executor.add_instance(SkillInstance::new(caster, skill, 1));

    assert!(executor.execute_skill(id, Some(enemy), None, &mut world));

    assert_eq!(world.health(enemy), Some(90.0));
    assert_eq!(labels(&executor), vec!["started", "completed"]);
}

#[test]
fn block_failure_reports_the_entry() {
    let mut world = ArenaWorld::new();
    let caster = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
    let ghost = world.spawn(EntitySpec::new(Vec3::X, Faction(2)).without_health());
    let mut executor = SkillExecutor::new();
    let id = executor.add_instance(SkillInstance::new(caster, build(bolt()), 1));

    assert!(executor.execute_skill(id, Some(ghost), None, &mut world));

    assert!(matches!(
        executor.events().history().last(),
        Some(SkillEvent::Failed {
            reason: FailureReason::BlockFailed { index: 0, block },
            ..
        }) if block == "damage"
    ));
    // the cast itself went through, so the cooldown stands
    assert!(executor.instance(id).unwrap().is_on_cooldown());
}

/// Effect that always reports being interrupted.
#[derive(Debug)]
struct Silenced;

impl Block for Silenced {
    fn id(&self) -> &str {
        "silenced"
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Effect
    }

    fn execute(&self, _ctx: &mut ExecutionContext, _world: &mut dyn World) -> BlockStatus {
        BlockStatus::Interrupted
    }
}

#[test]
fn block_interrupt_ends_the_execution() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let skill = build(
        bolt()
            .block_ref(Arc::new(Silenced))
            .block(damage(25.0))
            .cast_time(1.0)
            .cost(ResourceKind::Mana, 20.0),
    );
    let id = add(&mut executor, &arena, skill);

    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
    executor.update(1.0, &mut arena.world);

    // the first hit landed, the one after the interrupt did not
    assert_eq!(arena.world.health(arena.enemy), Some(90.0));
    assert_eq!(executor.active_executions(), 0);
    assert_eq!(labels(&executor), vec!["started", "interrupted"]);
    assert!(matches!(
        executor.events().history().last(),
        Some(SkillEvent::Interrupted {
            cause: InterruptCause::Block { index: 1 },
            refunded: false,
            ..
        })
    ));
    assert_eq!(mana(&arena), 30.0);
    let instance = executor.instance(id).unwrap();
    assert!(!instance.is_casting());
    assert_eq!(instance.cast_progress(), 0.0);
    assert_eq!(instance.state(), CastState::Cooldown);
}

#[test]
fn owner_death_fails_in_flight_casts() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt().cast_time(1.0)));
    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);

    arena.world.despawn(arena.caster);
    executor.update(0.1, &mut arena.world);

    assert_eq!(executor.instance_count(), 0);
    assert_eq!(executor.active_executions(), 0);
    assert!(matches!(
        executor.events().history().last(),
        Some(SkillEvent::Failed {
            reason: FailureReason::OwnerDestroyed,
            ..
        })
    ));
}

#[test]
fn stop_all_interrupts_everything() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let first = add(&mut executor, &arena, build(bolt().cast_time(1.0)));
    let second = add(
        &mut executor,
        &arena,
        build(SkillBuilder::new("slow").block(damage(1.0)).cast_time(3.0)),
    );
    executor.execute_skill(first, Some(arena.enemy), None, &mut arena.world);
    executor.execute_skill(second, Some(arena.enemy), None, &mut arena.world);

    assert_eq!(executor.stop_all_skills(&mut arena.world), 2);
    assert_eq!(executor.active_executions(), 0);
    assert!(executor.instance(first).unwrap().can_cast());
    assert!(executor.instance(second).unwrap().can_cast());
    assert_eq!(arena.world.health(arena.enemy), Some(100.0));
}

#[test]
fn toggle_skills_flip_on_completion() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let aura = build(
        SkillBuilder::new("aura")
            .kind(SkillKind::Toggle)
            .block(BlockSpec::new("heal").with("amount", 1.0f32))
            .targeting(TargetResolver::caster()),
    );
    let id = add(&mut executor, &arena, aura);

    executor.execute_skill(id, None, None, &mut arena.world);
    assert!(executor.instance(id).unwrap().is_active());
    executor.execute_skill(id, None, None, &mut arena.world);
    assert!(!executor.instance(id).unwrap().is_active());
}

#[test]
fn same_seed_same_rolls() {
    fn run(seed: u64) -> Vec<f32> {
        let mut arena = arena();
        let config = ExecutorConfig::default().with_base_seed(seed);
        let mut executor = SkillExecutor::with_config(config).expect("valid config");
        let skill = build(
            SkillBuilder::new("wild")
                .block(damage(10.0).with("jitter", true).with("crit_chance", 0.5f32)),
        );
        let id = add(&mut executor, &arena, skill);
        (0..5)
            .map(|_| {
                executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);
                arena.world.health(arena.enemy).unwrap_or_default()
            })
            .collect()
    }

    assert_eq!(run(7), run(7));
}

#[test]
fn events_serialize_with_snake_case_tags() {
    let mut arena = arena();
    let mut executor = SkillExecutor::new();
    let id = add(&mut executor, &arena, build(bolt()));
    executor.execute_skill(id, Some(arena.enemy), None, &mut arena.world);

    let started = executor.events().history().next().expect("started");
    let json = serde_json::to_value(started).expect("serializable");
    assert_eq!(json["event"], "started");
    assert_eq!(json["cast"]["skill"], "bolt");
}
