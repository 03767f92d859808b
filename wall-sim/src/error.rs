//! Errors surfaced by the simulation engine

use std::time::Duration;

use wall_types::{DomainError, ProfileId};

use crate::actors::protocol::WorkerId;

/// Errors that can occur while configuring or running a simulation
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// No profiles given, nothing to simulate
    #[error("empty profiles collection given")]
    EmptyProfiles,
    /// Worker count must be positive
    #[error("workers number must be positive")]
    NoWorkers,
    /// A profile could not be built from its initial heights
    #[error("invalid profile {profile_id}: {source}")]
    InvalidProfile {
        profile_id: ProfileId,
        #[source]
        source: DomainError,
    },
    /// The manager actor could not be started
    #[error("failed to start manager: {0}")]
    Spawn(String),
    /// A worker failed while holding part of the wall
    #[error("worker {worker_id} failed: {reason}")]
    WorkerFailed { worker_id: WorkerId, reason: String },
    /// A worker stopped before the wall was built
    #[error("worker {worker_id} stopped before the wall was built")]
    WorkerStopped { worker_id: WorkerId },
    /// Manager received a message that breaks the day barrier protocol
    #[error("protocol violation: {0}")]
    Protocol(String),
    /// Manager went away without publishing the wall
    #[error("manager stopped without publishing output")]
    ManagerStopped,
    /// Simulation exceeded the caller's deadline
    #[error("simulation did not finish within {0:?}")]
    Timeout(Duration),
}
