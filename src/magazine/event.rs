//! Change notifications for presentation layers

use super::slot::SlotIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something that changed on the current magazine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MagazineEvent {
    /// The magazine was replaced; all previous occupancy is gone
    Reconfigured {
        total_slots: usize,
        circular: bool,
        run_length: usize,
    },
    /// The visible prefix changed
    CapacityChanged { active_capacity: usize },
    /// A run was allocated
    SlotsOccupied {
        start: usize,
        slots: Vec<SlotIndex>,
    },
    /// No run of the requested length was free
    RunNotFound { run_length: usize },
}

impl fmt::Display for MagazineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagazineEvent::Reconfigured {
                total_slots,
                circular,
                run_length,
            } => write!(
                f,
                "reconfigured: {} slots, circular={}, run length {}",
                total_slots, circular, run_length
            ),
            MagazineEvent::CapacityChanged { active_capacity } => {
                write!(f, "capacity changed: {} visible slots", active_capacity)
            }
            MagazineEvent::SlotsOccupied { start, slots } => {
                write!(f, "occupied {} slots from position {}", slots.len(), start)
            }
            MagazineEvent::RunNotFound { run_length } => {
                write!(f, "no free run of {} slots", run_length)
            }
        }
    }
}
