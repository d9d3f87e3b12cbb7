//! Slot state for a magazine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device-relative position of a slot
///
/// Stable for the life of a magazine instance. Distinct from the
/// visible-subset index that the run finder works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    /// Get the raw position
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

/// A single position in the magazine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Whether this slot has been allocated
    pub occupied: bool,
    /// Whether this slot participates in allocation and display
    pub visible: bool,
}

impl Slot {
    /// Create a new free, visible slot
    pub fn new() -> Self {
        Self {
            occupied: false,
            visible: true,
        }
    }

    /// Mark this slot occupied
    pub fn occupy(&mut self) {
        self.occupied = true;
    }

    /// Whether this slot can take part in a new run
    pub fn is_free(&self) -> bool {
        self.visible && !self.occupied
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of one slot, handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub index: SlotIndex,
    pub occupied: bool,
    pub visible: bool,
}
