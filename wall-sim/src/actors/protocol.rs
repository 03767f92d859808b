//! Messages exchanged between the manager and its workers
//!
//! Sections travel by value: `NewSection` moves one from the manager's pool
//! into a worker, `WorkerReady` with a section moves it back. Nobody else
//! holds a reference to a section in flight.

use std::fmt;

use ractor::{ActorRef, RpcReplyPort};
use serde::Serialize;
use wall_types::Section;

/// Worker identifier, 1-based in start order
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Advance the simulation to `day` (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayEvent {
    pub day: u32,
}

/// The receiving worker now owns `section`. The manager claims the section
/// before sending it.
#[derive(Debug)]
pub struct NewSectionEvent {
    pub section: Section,
}

/// A worker processed `day`. `section` is set only when the held section
/// was completed on that day.
#[derive(Debug)]
pub struct WorkerReadyEvent {
    pub worker_id: WorkerId,
    pub day: u32,
    pub section: Option<Section>,
}

/// Terminate
///
/// Delivered on the worker's stop signal instead of its mailbox, so it is
/// seen before any `Day` or `NewSection` still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitEvent;

impl ExitEvent {
    pub const REASON: &'static str = "exit requested";

    pub fn send(self, worker: &ActorRef<WorkerMsg>) {
        worker.stop(Some(Self::REASON.to_string()));
    }
}

/// Messages handled by WorkerActor
#[derive(Debug)]
pub enum WorkerMsg {
    Day(DayEvent),
    NewSection(NewSectionEvent),
}

/// Messages handled by ManagerActor
#[derive(Debug)]
pub enum ManagerMsg {
    /// Day acknowledgement from a worker
    WorkerReady(WorkerReadyEvent),
    /// Snapshot of the coordination state
    GetStatus { reply: RpcReplyPort<ManagerStatus> },
}

/// Point-in-time view of a running simulation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManagerStatus {
    pub run_id: String,
    /// Last day broadcast to the workers, 0 before the first one
    pub current_day: u32,
    pub active_workers: usize,
    pub sections_on_loan: usize,
    pub completed_profiles: usize,
    pub total_profiles: usize,
    pub finished: bool,
}
