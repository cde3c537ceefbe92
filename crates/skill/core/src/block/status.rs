//! Status returned by blocks.

/// The result of one [`Block::execute`](crate::Block::execute) call.
///
/// Unlike the instant success/failure of a turn-based tree, blocks may span
/// several ticks: composites that wait return `InProgress` and are re-entered
/// on the next tick with the same context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockStatus {
    /// The block finished and the sequence may continue.
    Success,

    /// The block could not do its job (no valid target, out of range, ...).
    ///
    /// Aborts the skill unless the entry is marked optional.
    Failure,

    /// The block was cut short and the whole skill must stop.
    Interrupted,

    /// The block has deferred work and must be called again next tick.
    InProgress,
}

impl BlockStatus {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, BlockStatus::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, BlockStatus::Failure)
    }

    /// Returns `true` for every status except `InProgress`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, BlockStatus::InProgress)
    }
}
