//! Entity identity, faction and side filtering.

use core::fmt;

use bitflags::bitflags;

/// Opaque handle to an entity owned by the host game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team tag used to decide whether two entities are allies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Faction(pub u16);

bitflags! {
    /// Which sides a targeting strategy may select, relative to the source.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SideMask: u8 {
        const SELF    = 1 << 0;
        const ALLIES  = 1 << 1;
        const ENEMIES = 1 << 2;
        const ALL     = Self::SELF.bits() | Self::ALLIES.bits() | Self::ENEMIES.bits();
    }
}

impl SideMask {
    /// Returns true if a candidate with the given relation to the source passes.
    ///
    /// The source itself is only admitted through `SELF`, never through `ALLIES`.
    pub fn admits(self, is_source: bool, same_faction: bool) -> bool {
        if is_source {
            self.contains(SideMask::SELF)
        } else if same_faction {
            self.contains(SideMask::ALLIES)
        } else {
            self.contains(SideMask::ENEMIES)
        }
    }
}
