//! Slot store for a single magazine

use super::slot::{Slot, SlotIndex, SlotView};
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// A fixed-size magazine of slots
///
/// Holds occupancy and visibility per slot. Only visible slots take part in
/// run finding, but occupancy is always written back by device index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magazine {
    slots: Vec<Slot>,
    circular: bool,
    active_capacity: usize,
    run_length: usize,
}

impl Magazine {
    /// Build a fresh magazine
    ///
    /// All slots start free and visible.
    ///
    /// # Arguments
    /// * `total_slots` - Number of slots in the device
    /// * `circular` - Whether the last visible slot neighbours the first
    /// * `run_length` - Default run length for allocation requests (>= 1)
    pub fn new(total_slots: usize, circular: bool, run_length: usize) -> Result<Self> {
        if run_length == 0 {
            return Err(Error::InvalidRunLength(run_length));
        }

        info!(total_slots, circular, run_length, "Configuring magazine");

        Ok(Self {
            slots: vec![Slot::new(); total_slots],
            circular,
            active_capacity: total_slots,
            run_length,
        })
    }

    /// Total number of slots, visible or not
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    pub fn active_capacity(&self) -> usize {
        self.active_capacity
    }

    /// Default or last-requested run length
    pub fn run_length(&self) -> usize {
        self.run_length
    }

    /// Update the default run length
    pub fn set_run_length(&mut self, run_length: usize) -> Result<()> {
        if run_length == 0 {
            return Err(Error::InvalidRunLength(run_length));
        }
        self.run_length = run_length;
        Ok(())
    }

    /// Make the first `capacity` slots visible and hide the rest
    ///
    /// Occupancy is left untouched.
    pub fn set_active_capacity(&mut self, capacity: usize) -> Result<()> {
        let total = self.slots.len();
        if capacity > total {
            return Err(Error::CapacityOutOfRange {
                requested: capacity,
                total,
            });
        }

        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.visible = i < capacity;
        }
        self.active_capacity = capacity;

        debug!(capacity, total, "Updated slot visibility");
        Ok(())
    }

    /// Occupancy of visible slots, in slot order
    pub fn visible_occupancy(&self) -> Vec<bool> {
        self.slots
            .iter()
            .filter(|slot| slot.visible)
            .map(|slot| slot.occupied)
            .collect()
    }

    /// Number of visible slots
    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.visible).count()
    }

    /// Device index of every visible slot, in slot order
    ///
    /// Entry `n` is the device position of visible index `n`. Build it once
    /// per allocation and index into it for each run position.
    pub fn visible_indices(&self) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.visible)
            .map(|(i, _)| SlotIndex(i))
            .collect()
    }

    /// Translate a single visible-subset index into a device index
    ///
    /// Returns `None` if fewer than `visible_index + 1` slots are visible.
    pub fn visible_to_device(&self, visible_index: usize) -> Option<SlotIndex> {
        self.visible_indices().get(visible_index).copied()
    }

    /// Mark slots occupied by device index
    ///
    /// Already-occupied slots are left as they are. All indices are checked
    /// before any slot is written.
    pub fn mark_occupied<I>(&mut self, indices: I) -> Result<()>
    where
        I: IntoIterator<Item = SlotIndex>,
    {
        let indices: Vec<SlotIndex> = indices.into_iter().collect();
        let total = self.slots.len();

        if let Some(bad) = indices.iter().find(|index| index.get() >= total) {
            return Err(Error::SlotOutOfRange {
                index: bad.get(),
                total,
            });
        }

        for index in indices {
            self.slots[index.get()].occupy();
        }
        Ok(())
    }

    /// Whether the slot at a device index is occupied
    pub fn is_occupied(&self, index: SlotIndex) -> Option<bool> {
        self.slots.get(index.get()).map(|slot| slot.occupied)
    }

    /// Read-only view of every slot
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotView {
                index: SlotIndex(i),
                occupied: slot.occupied,
                visible: slot.visible,
            })
            .collect()
    }

    /// Get statistics about the magazine
    pub fn stats(&self) -> MagazineStats {
        let mut stats = MagazineStats {
            total_slots: self.slots.len(),
            circular: self.circular,
            run_length: self.run_length,
            ..MagazineStats::default()
        };

        for slot in &self.slots {
            if slot.occupied {
                stats.occupied_slots += 1;
            }
            if slot.visible {
                stats.visible_slots += 1;
                if !slot.occupied {
                    stats.free_visible_slots += 1;
                }
            }
        }

        stats
    }
}

/// Statistics for a magazine
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MagazineStats {
    pub total_slots: usize,
    pub visible_slots: usize,
    pub occupied_slots: usize,
    pub free_visible_slots: usize,
    pub circular: bool,
    pub run_length: usize,
}
