//! Grammar classes of blocks.

/// Category of a block, used by the grammar validator.
///
/// - `Effect`: changes the world (damage, heal, status, teleport)
/// - `Target`: re-targets the remaining work (ForEachTarget)
/// - `Modifier`: adjusts how later blocks behave (chain, variables)
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::EnumCount,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockCategory {
    Effect,
    Target,
    Modifier,
}
