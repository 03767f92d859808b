//! Day barrier
//!
//! Only the open day is tracked: day N+1 is broadcast after every active
//! worker acknowledged day N, so no acknowledgement for any other day can be
//! legitimately outstanding.

use std::collections::HashSet;

use crate::actors::protocol::{DayEvent, WorkerId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BarrierError {
    #[error("{worker_id} acknowledged day {got} while day {expected} is open")]
    UnexpectedDay {
        worker_id: WorkerId,
        expected: u32,
        got: u32,
    },
    #[error("{worker_id} acknowledged day {day} twice")]
    DuplicateAck { worker_id: WorkerId, day: u32 },
}

#[derive(Debug)]
pub struct DayBarrier {
    parties: usize,
    current_day: u32,
    acked: HashSet<WorkerId>,
}

impl DayBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            current_day: 0,
            acked: HashSet::with_capacity(parties),
        }
    }

    /// Last day opened, 0 before the first one
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    /// Opens the next day and returns the event to broadcast.
    pub fn open_next_day(&mut self) -> DayEvent {
        self.current_day += 1;
        self.acked.clear();
        DayEvent {
            day: self.current_day,
        }
    }

    /// Records an acknowledgement. Returns true when it was the last one
    /// missing for the open day.
    pub fn acknowledge(&mut self, worker_id: WorkerId, day: u32) -> Result<bool, BarrierError> {
        if day != self.current_day {
            return Err(BarrierError::UnexpectedDay {
                worker_id,
                expected: self.current_day,
                got: day,
            });
        }
        if !self.acked.insert(worker_id) {
            return Err(BarrierError::DuplicateAck { worker_id, day });
        }
        Ok(self.acked.len() == self.parties)
    }
}
