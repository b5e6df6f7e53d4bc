//! BrickId - stable handle to a live brick in the brick graph.

use std::fmt;

/// Generational handle into the brick graph arena.
///
/// A handle stays valid until its brick is removed; the slot may then be
/// reused by a new brick, but with a bumped generation so stale handles
/// never alias it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrickId {
    /// Slot index in the arena
    pub index: u32,
    /// Slot generation at allocation time
    pub generation: u32,
}

impl BrickId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for BrickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
