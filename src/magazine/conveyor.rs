//! Allocation orchestration over the current magazine
//!
//! The conveyor owns exactly one [`Magazine`]. An allocation reads the
//! visible occupancy, searches it with [`find_run`], and writes the run back
//! in device index space. Nothing is written unless the search succeeds.

use super::event::MagazineEvent;
use super::run::{find_run, run_positions};
use super::slot::{SlotIndex, SlotView};
use super::store::{Magazine, MagazineStats};
use crate::config::MagazineConfig;
use crate::error::{Error, Result};
use crate::metrics;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Outcome of one allocation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    /// Start of the run in visible-index space, `None` if no run was free
    pub start: Option<usize>,
    /// Requested run length
    pub run_length: usize,
    /// Device indices marked by this request, in run order
    pub occupied: Vec<SlotIndex>,
}

impl AllocationResult {
    fn not_found(run_length: usize) -> Self {
        Self {
            start: None,
            run_length,
            occupied: Vec::new(),
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.start.is_some()
    }

    /// Start index with `-1` standing for "no run found"
    pub fn start_index(&self) -> i64 {
        self.start.map_or(-1, |start| start as i64)
    }
}

impl fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(
                f,
                "Allocated {} places starting at position {}",
                self.run_length, start
            ),
            None => write!(
                f,
                "There are not enough free positions for {} needed places.",
                self.run_length
            ),
        }
    }
}

/// Pending events kept between drains; the oldest are dropped past this
pub const EVENT_CAPACITY: usize = 1024;

/// Owner of the current magazine
#[derive(Debug)]
pub struct Conveyor {
    magazine: Magazine,
    events: VecDeque<MagazineEvent>,
}

impl Conveyor {
    /// Create a conveyor from configuration
    pub fn new(config: &MagazineConfig) -> Result<Self> {
        config.validate()?;

        let mut conveyor = Self {
            magazine: Magazine::new(config.total_slots, config.circular, config.run_length)?,
            events: VecDeque::new(),
        };
        conveyor.record_reconfigured();

        if let Some(capacity) = config.active_capacity {
            conveyor.set_active_capacity(capacity)?;
        }

        Ok(conveyor)
    }

    /// Replace the current magazine with a fresh one
    ///
    /// No occupancy carries over. On error the current magazine is kept.
    pub fn configure(&mut self, total_slots: usize, circular: bool, run_length: usize) -> Result<()> {
        self.magazine = Magazine::new(total_slots, circular, run_length)?;
        self.record_reconfigured();
        Ok(())
    }

    /// Limit allocation to the first `capacity` slots
    pub fn set_active_capacity(&mut self, capacity: usize) -> Result<()> {
        self.magazine.set_active_capacity(capacity)?;
        self.push_event(MagazineEvent::CapacityChanged {
            active_capacity: capacity,
        });
        metrics::record_layout(&self.magazine.stats());
        Ok(())
    }

    /// Allocate a run with the magazine's current run length
    pub fn allocate_default(&mut self) -> Result<AllocationResult> {
        let run_length = self.magazine.run_length();
        self.allocate(run_length)
    }

    /// Allocate a contiguous run of `run_length` visible slots
    ///
    /// A missing run is reported through [`AllocationResult::start`], not as
    /// an error. Only a zero run length is rejected.
    #[instrument(skip(self))]
    pub fn allocate(&mut self, run_length: usize) -> Result<AllocationResult> {
        self.magazine.set_run_length(run_length)?;

        let visible = self.magazine.visible_occupancy();
        let start = match find_run(&visible, self.magazine.is_circular(), run_length) {
            Some(start) => start,
            None => {
                warn!(run_length, visible = visible.len(), "No free run found");
                self.push_event(MagazineEvent::RunNotFound { run_length });
                metrics::record_allocation(false, run_length);
                return Ok(AllocationResult::not_found(run_length));
            }
        };

        let device = self.magazine.visible_indices();
        let occupied = run_positions(start, run_length, visible.len())
            .map(|position| {
                device.get(position).copied().ok_or(Error::SlotOutOfRange {
                    index: position,
                    total: device.len(),
                })
            })
            .collect::<Result<Vec<SlotIndex>>>()?;

        self.magazine.mark_occupied(occupied.iter().copied())?;
        debug!(start, ?occupied, "Allocated run");

        self.push_event(MagazineEvent::SlotsOccupied {
            start,
            slots: occupied.clone(),
        });
        metrics::record_allocation(true, run_length);
        metrics::record_layout(&self.magazine.stats());

        Ok(AllocationResult {
            start: Some(start),
            run_length,
            occupied,
        })
    }

    /// Read-only view of every slot
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.magazine.snapshot()
    }

    pub fn stats(&self) -> MagazineStats {
        self.magazine.stats()
    }

    /// The current magazine
    pub fn magazine(&self) -> &Magazine {
        &self.magazine
    }

    /// Drain pending change events, oldest first
    ///
    /// At most [`EVENT_CAPACITY`] events are held. Older ones are dropped.
    pub fn take_events(&mut self) -> Vec<MagazineEvent> {
        self.events.drain(..).collect()
    }

    fn push_event(&mut self, event: MagazineEvent) {
        if self.events.len() == EVENT_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn record_reconfigured(&mut self) {
        self.push_event(MagazineEvent::Reconfigured {
            total_slots: self.magazine.total_slots(),
            circular: self.magazine.is_circular(),
            run_length: self.magazine.run_length(),
        });
        metrics::record_reconfigure(&self.magazine.stats());
    }
}

/// A conveyor shared between threads
///
/// Each operation holds the lock for its whole read-search-write cycle, so
/// at most one allocation is in flight.
#[derive(Debug, Clone)]
pub struct SharedConveyor {
    inner: Arc<Mutex<Conveyor>>,
}

impl SharedConveyor {
    pub fn new(conveyor: Conveyor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conveyor)),
        }
    }

    pub fn allocate(&self, run_length: usize) -> Result<AllocationResult> {
        self.inner.lock().allocate(run_length)
    }

    pub fn configure(&self, total_slots: usize, circular: bool, run_length: usize) -> Result<()> {
        self.inner.lock().configure(total_slots, circular, run_length)
    }

    pub fn snapshot(&self) -> Vec<SlotView> {
        self.inner.lock().snapshot()
    }

    pub fn take_events(&self) -> Vec<MagazineEvent> {
        self.inner.lock().take_events()
    }
}
