use core::fmt;
use std::sync::Arc;

use crate::block::{Block, BlockCategory, BlockStatus};
use crate::capability::World;
use crate::config::SkillConfig;
use crate::context::ExecutionContext;
use crate::entity::EntityId;
use crate::skill::{RunState, SequenceRun, Skill};

use super::CompositeState;

/// Builds the sub-skill run on behalf of one outer target.
pub type SkillFactory = Arc<dyn Fn(EntityId) -> Arc<Skill> + Send + Sync>;

/// Runs a sub-skill once per current target.
///
/// For each target `T` the factory produces a skill that runs in its own
/// context: source `T`, targets resolved by the sub-skill's resolver from `T`,
/// an empty variable store, and an RNG seeded from the parent stream. Nested
/// runs that defer are kept in the parent's resume slot and stepped on later
/// ticks. Succeeds once every nested run completed; fails if any did not.
#[derive(Clone)]
pub struct ForEachTargetBlock {
    factory: SkillFactory,
}

impl ForEachTargetBlock {
    pub const ID: &'static str = "for_each_target";

    pub fn new(factory: impl Fn(EntityId) -> Arc<Skill> + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Runs the same skill for every target.
    pub fn for_skill(skill: Arc<Skill>) -> Self {
        Self::new(move |_| Arc::clone(&skill))
    }
}

impl fmt::Debug for ForEachTargetBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForEachTargetBlock").finish_non_exhaustive()
    }
}

impl Block for ForEachTargetBlock {
    fn id(&self) -> &str {
        Self::ID
    }

    fn category(&self) -> BlockCategory {
        BlockCategory::Target
    }

    fn execute(&self, ctx: &mut ExecutionContext, world: &mut dyn World) -> BlockStatus {
        let dt = ctx.delta_time();
        let runs = match ctx.take_resume() {
            Some(CompositeState::Nested(runs)) => {
                let mut runs = runs;
                for run in runs.iter_mut().filter(|r| r.is_running()) {
                    run.step(dt, world);
                }
                runs
            }
            _ => {
                if ctx.nesting_depth() >= SkillConfig::MAX_NESTING_DEPTH {
                    return BlockStatus::Failure;
                }
                let targets = ctx.targets().to_vec();
                if targets.is_empty() {
                    return BlockStatus::Failure;
                }
                let mut runs: Vec<NestedRun> = targets
                    .into_iter()
                    .map(|target| NestedRun::start(ctx, target, (self.factory)(target), &*world))
                    .collect();
                for run in &mut runs {
                    run.step(dt, world);
                }
                runs
            }
        };

        if runs.iter().any(NestedRun::is_running) {
            ctx.store_resume(CompositeState::Nested(runs));
            return BlockStatus::InProgress;
        }
        if runs.iter().all(|r| r.state == RunState::Completed) {
            BlockStatus::Success
        } else {
            BlockStatus::Failure
        }
    }
}

/// One sub-skill execution owned by a [`ForEachTargetBlock`].
#[derive(Debug)]
pub(crate) struct NestedRun {
    skill: Arc<Skill>,
    ctx: ExecutionContext,
    run: SequenceRun,
    state: RunState,
}

impl NestedRun {
    fn start(
        parent: &mut ExecutionContext,
        target: EntityId,
        skill: Arc<Skill>,
        world: &dyn World,
    ) -> Self {
        let mut ctx = parent.spawn_nested(target);
        let targets = skill.resolver().resolve(target, world, ctx.rng());
        ctx.set_targets(targets);
        Self {
            skill,
            ctx,
            run: SequenceRun::new(),
            state: RunState::Running,
        }
    }

    fn step(&mut self, dt: f32, world: &mut dyn World) {
        let report = self.run.step(&self.skill, &mut self.ctx, world, dt);
        self.state = report.state;
    }

    fn is_running(&self) -> bool {
        self.state == RunState::Running
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use glam::Vec3;

    use super::*;
    use crate::arena::{ArenaWorld, EntitySpec};
    use crate::block::{BlockRef, BlockRegistry, BlockSpec, DamageBlock, DelayedBlock};
    use crate::context::{ExecutionId, SkillRng, keys};
    use crate::entity::Faction;
    use crate::skill::SkillBuilder;

    fn three_enemies() -> (ArenaWorld, EntityId, Vec<EntityId>) {
        let mut world = ArenaWorld::new();
        let source = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
        let enemies = (1..=3)
            .map(|i| world.spawn(EntitySpec::new(Vec3::new(i as f32, 0.0, 0.0), Faction(2))))
            .collect();
        (world, source, enemies)
    }

    #[test]
    fn runs_one_isolated_execution_per_target() {
        let (mut world, source, enemies) = three_enemies();
        let registry = BlockRegistry::with_builtins();
        let bolt = Arc::new(
            SkillBuilder::new("bolt")
                .block(BlockSpec::new("damage").with("amount", 5.0f32))
                .build(&registry)
                .expect("valid sub-skill"),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let block = ForEachTargetBlock::new(move |target| {
            log.lock().expect("lock").push(target);
            Arc::clone(&bolt)
        });

        let mut ctx = ExecutionContext::new(ExecutionId(0), source, 1, SkillRng::with_seed(3))
            .with_targets(enemies.clone());
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Success);

        assert_eq!(*seen.lock().expect("lock"), enemies);
        for enemy in &enemies {
            assert_eq!(world.health(*enemy), Some(95.0));
        }
        // nested contexts never write into the parent
        assert!(!ctx.contains(keys::DAMAGE_TOTAL));
        assert_eq!(world.health(source), Some(100.0));
    }

    /// Records the source and targets each nested context hands it.
    #[derive(Debug, Default)]
    struct TargetLog(Mutex<Vec<(EntityId, Vec<EntityId>)>>);

    impl Block for TargetLog {
        fn id(&self) -> &str {
            "target_log"
        }

        fn category(&self) -> BlockCategory {
            BlockCategory::Effect
        }

        fn execute(&self, ctx: &mut ExecutionContext, _world: &mut dyn World) -> BlockStatus {
            if let Ok(mut seen) = self.0.lock() {
                seen.push((ctx.source(), ctx.targets().to_vec()));
            }
            BlockStatus::Success
        }
    }

    #[test]
    fn nested_context_targets_only_its_originating_target() {
        let (mut world, source, enemies) = three_enemies();
        let log = Arc::new(TargetLog::default());
        let echo = Arc::new(
            SkillBuilder::new("echo")
                .block_ref(Arc::clone(&log) as BlockRef)
                .build(&BlockRegistry::with_builtins())
                .expect("valid sub-skill"),
        );
        let block = ForEachTargetBlock::for_skill(echo);
        let mut ctx = ExecutionContext::new(ExecutionId(0), source, 1, SkillRng::with_seed(1))
            .with_targets(enemies.clone());

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Success);

        let seen = log.0.lock().expect("lock").clone();
        let expected: Vec<_> = enemies.iter().map(|&e| (e, vec![e])).collect();
        assert_eq!(seen, expected);
        // the parent keeps its own target list
        assert_eq!(ctx.targets(), enemies.as_slice());
    }

    #[test]
    fn deferred_nested_runs_resume_on_later_ticks() {
        let (mut world, source, enemies) = three_enemies();
        let registry = BlockRegistry::with_builtins();
        let slow = Arc::new(
            SkillBuilder::new("slow_bolt")
                .block_ref(Arc::new(DelayedBlock::new(Arc::new(DamageBlock::new(5.0)), 1.0)))
                .build(&registry)
                .expect("valid sub-skill"),
        );
        let block = ForEachTargetBlock::for_skill(slow);
        let mut ctx = ExecutionContext::new(ExecutionId(0), source, 1, SkillRng::with_seed(3))
            .with_targets(enemies.clone());

        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::InProgress);
        assert_eq!(world.health(enemies[0]), Some(100.0));

        ctx.set_delta_time(1.0);
        assert_eq!(block.execute(&mut ctx, &mut world), BlockStatus::Success);
        assert!(enemies.iter().all(|e| world.health(*e) == Some(95.0)));
    }

    #[test]
    fn no_targets_fails() {
        let (mut world, source, _) = three_enemies();
        let registry = BlockRegistry::with_builtins();
        let skill = Arc::new(
            SkillBuilder::new("noop")
                .block(BlockSpec::new("damage").with("amount", 1.0f32))
                .build(&registry)
                .expect("valid sub-skill"),
        );
        let mut ctx = ExecutionContext::new(ExecutionId(0), source, 1, SkillRng::with_seed(0));
        assert_eq!(
            ForEachTargetBlock::for_skill(skill).execute(&mut ctx, &mut world),
            BlockStatus::Failure
        );
    }
}
