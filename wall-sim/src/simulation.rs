//! Simulation engine handle
//!
//! Each simulation is an explicitly constructed `WallSimulation`. Input is
//! validated synchronously, before any actor exists; `start` then spawns the
//! manager, which starts its own workers.

use std::time::Duration;

use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorRef};
use tokio::sync::oneshot;
use wall_types::{Profile, ProfileId};

use crate::actors::manager::{ManagerActor, ManagerArguments, SimulationOutput};
use crate::actors::protocol::{ManagerMsg, ManagerStatus};
use crate::error::SimulationError;

pub const DEFAULT_HALT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Upper bound on concurrently working teams
    pub workers_num: usize,
    /// How long the manager waits for each worker to exit
    pub halt_timeout: Duration,
}

impl SimulationConfig {
    pub fn new(workers_num: usize) -> Self {
        Self {
            workers_num,
            halt_timeout: DEFAULT_HALT_TIMEOUT,
        }
    }
}

/// A validated, not yet started simulation
#[derive(Debug)]
pub struct WallSimulation {
    run_id: String,
    profiles: Vec<Profile>,
    config: SimulationConfig,
}

impl WallSimulation {
    /// Builds profiles from their initial heights. Profile ids are assigned
    /// from 1 in input order.
    pub fn new<P: AsRef<[u32]>>(
        heights: &[P],
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        if heights.is_empty() {
            return Err(SimulationError::EmptyProfiles);
        }
        if config.workers_num == 0 {
            return Err(SimulationError::NoWorkers);
        }

        let profiles = heights
            .iter()
            .enumerate()
            .map(|(i, profile_heights)| {
                let profile_id = ProfileId(i + 1);
                Profile::new(profile_id, profile_heights.as_ref())
                    .map_err(|source| SimulationError::InvalidProfile { profile_id, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            run_id: ulid::Ulid::new().to_string(),
            profiles,
            config,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Spawns the manager and returns without waiting for the wall.
    pub async fn start(self) -> Result<SimulationHandle, SimulationError> {
        let (output, result) = oneshot::channel();
        let args = ManagerArguments {
            run_id: self.run_id.clone(),
            profiles: self.profiles,
            workers_num: self.config.workers_num,
            halt_timeout: self.config.halt_timeout,
            output,
        };

        tracing::info!(
            run_id = %self.run_id,
            workers_num = self.config.workers_num,
            "Starting wall simulation"
        );
        let (manager, join) = Actor::spawn(None, ManagerActor, args)
            .await
            .map_err(|e| SimulationError::Spawn(e.to_string()))?;

        Ok(SimulationHandle {
            run_id: self.run_id,
            manager,
            join,
            result,
        })
    }

    /// Runs the simulation to the end.
    pub async fn run(self) -> Result<Vec<Profile>, SimulationError> {
        self.start().await?.wait().await
    }

    /// Runs the simulation, giving up after `deadline`.
    pub async fn run_with_timeout(
        self,
        deadline: Duration,
    ) -> Result<Vec<Profile>, SimulationError> {
        self.start().await?.wait_timeout(deadline).await
    }
}

/// A running simulation
pub struct SimulationHandle {
    run_id: String,
    manager: ActorRef<ManagerMsg>,
    join: JoinHandle<()>,
    result: oneshot::Receiver<SimulationOutput>,
}

impl SimulationHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn status(&self) -> Result<ManagerStatus, SimulationError> {
        ractor::call!(self.manager, |reply| ManagerMsg::GetStatus { reply })
            .map_err(|_| SimulationError::ManagerStopped)
    }

    /// Blocks until the manager publishes the wall.
    pub async fn wait(self) -> Result<Vec<Profile>, SimulationError> {
        let outcome = self.result.await.unwrap_or(Err(SimulationError::ManagerStopped));
        let _ = self.join.await;
        outcome
    }

    /// Like `wait`, but stops the manager and all of its workers once
    /// `deadline` passes.
    pub async fn wait_timeout(mut self, deadline: Duration) -> Result<Vec<Profile>, SimulationError> {
        match tokio::time::timeout(deadline, &mut self.result).await {
            Ok(received) => {
                let _ = self.join.await;
                received.unwrap_or(Err(SimulationError::ManagerStopped))
            }
            Err(_) => {
                tracing::warn!(run_id = %self.run_id, ?deadline, "Simulation deadline exceeded");
                self.manager.stop(Some("deadline exceeded".to_string()));
                let _ = self.join.await;
                Err(SimulationError::Timeout(deadline))
            }
        }
    }
}
