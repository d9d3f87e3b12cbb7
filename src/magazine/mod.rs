//! Magazine slot allocation
//!
//! A magazine is a fixed row of slots. A prefix of them is visible, and
//! contiguous runs of visible slots are handed out first-fit. Circular
//! magazines treat the last visible slot as adjacent to the first.
//!
//! # Architecture
//!
//! ```text
//! Conveyor (owns the current Magazine)
//!   ├─→ Magazine::visible_occupancy()   [F, T, T, F]   (visible-index space)
//!   ├─→ find_run(.., circular, k)       Some(3)
//!   ├─→ Magazine::visible_to_device()   3 → Slot(3), 0 → Slot(0)
//!   └─→ Magazine::mark_occupied()       (device-index space)
//! ```
//!
//! Occupancy only grows. The whole magazine is replaced on reconfiguration.

pub mod conveyor;
pub mod event;
pub mod run;
pub mod slot;
pub mod store;

pub use conveyor::{AllocationResult, Conveyor, SharedConveyor, EVENT_CAPACITY};
pub use event::MagazineEvent;
pub use run::{find_run, run_positions};
pub use slot::{Slot, SlotIndex, SlotView};
pub use store::{Magazine, MagazineStats};
