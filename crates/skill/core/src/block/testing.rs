//! Test doubles shared by block and skill tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;

use crate::arena::{ArenaWorld, EntitySpec};
use crate::block::{Block, BlockCategory, BlockRef, BlockStatus};
use crate::capability::World;
use crate::context::{ExecutionContext, ExecutionId, SkillRng};
use crate::entity::Faction;

/// Block returning a fixed status and counting its calls.
#[derive(Clone, Debug)]
pub(crate) struct Stub {
    status: BlockStatus,
    category: BlockCategory,
    ready: bool,
    calls: Arc<AtomicUsize>,
}

impl Stub {
    pub(crate) fn new(status: BlockStatus, category: BlockCategory) -> Self {
        Self {
            status,
            category,
            ready: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// An effect whose `can_execute` always refuses.
    pub(crate) fn unready() -> Self {
        Self {
            ready: false,
            ..Self::success()
        }
    }

    pub(crate) fn success() -> Self {
        Self::new(BlockStatus::Success, BlockCategory::Effect)
    }

    pub(crate) fn failure() -> Self {
        Self::new(BlockStatus::Failure, BlockCategory::Effect)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn block(&self) -> BlockRef {
        Arc::new(self.clone())
    }
}

impl Block for Stub {
    fn id(&self) -> &str {
        "stub"
    }

    fn category(&self) -> BlockCategory {
        self.category
    }

    fn can_execute(&self, _ctx: &ExecutionContext, _world: &dyn World) -> bool {
        self.ready
    }

    fn execute(&self, _ctx: &mut ExecutionContext, _world: &mut dyn World) -> BlockStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status
    }
}

/// A world with a source (#0) and one enemy (#1), and a context targeting it.
pub(crate) fn scripted_context() -> (ArenaWorld, ExecutionContext) {
    let mut world = ArenaWorld::new();
    let source = world.spawn(EntitySpec::new(Vec3::ZERO, Faction(1)));
    let target = world.spawn(EntitySpec::new(Vec3::X, Faction(2)));
    let ctx = ExecutionContext::new(ExecutionId(0), source, 1, SkillRng::with_seed(0))
        .with_targets([target]);
    (world, ctx)
}
