use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier for objects held in the graph arenas.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Panics for `u32::MAX`, the one index with no id.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.checked_add(index).expect("index+1 fits in u32"))
    }

    /// Id for the next slot of an arena of length `len`, if the arena can still grow.
    pub fn try_from_len(len: usize) -> Option<Self> {
        let index = u32::try_from(len).ok()?;
        NonZeroU32::MIN.checked_add(index).map(Self)
    }

    /// Id for the next slot of an arena of length `len`.
    ///
    /// Graph arenas are bounded by `u32`; running past that is a capacity bug, not an input
    /// error.
    pub fn from_len(len: usize) -> Self {
        Self::try_from_len(len).expect("graph arena exceeds u32 capacity")
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// The 0-based index as an arena slot.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type NodeId = Id;
pub type EdgeId = Id;
pub type BranchId = Id;
