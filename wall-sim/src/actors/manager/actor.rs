//! ManagerActor - owns the wall and drives the day barrier
//!
//! The ManagerActor is responsible for:
//! - Starting one linked WorkerActor per available section, up to `workers_num`
//! - Broadcasting days and waiting for every active worker's reply
//! - Reassigning workers that hand back a completed section
//! - Halting the workers and publishing the wall once it is built

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use tokio::sync::oneshot;
use wall_types::Profile;

use crate::actors::manager::state::{Coordinator, Directive};
use crate::actors::protocol::{
    DayEvent, ExitEvent, ManagerMsg, NewSectionEvent, WorkerId, WorkerMsg,
};
use crate::actors::worker::{WorkerActor, WorkerArguments};
use crate::error::SimulationError;

/// What the manager publishes exactly once, at termination
pub type SimulationOutput = Result<Vec<Profile>, SimulationError>;

/// ManagerActor - coordination actor, supervisor of its workers
#[derive(Debug, Default)]
pub struct ManagerActor;

/// Arguments for spawning ManagerActor
pub struct ManagerArguments {
    /// Correlates log lines of one simulation run
    pub run_id: String,
    /// The whole wall, in profile id order
    pub profiles: Vec<Profile>,
    /// Upper bound on started workers
    pub workers_num: usize,
    /// How long to wait for each worker to exit before killing it
    pub halt_timeout: Duration,
    /// Single-use output channel
    pub output: oneshot::Sender<SimulationOutput>,
}

struct WorkerSlot {
    actor: ActorRef<WorkerMsg>,
    join: Option<JoinHandle<()>>,
}

/// Internal state for ManagerActor
pub struct ManagerState {
    run_id: String,
    coordinator: Coordinator,
    workers: BTreeMap<WorkerId, WorkerSlot>,
    halt_timeout: Duration,
    output: Option<oneshot::Sender<SimulationOutput>>,
}

#[async_trait]
impl Actor for ManagerActor {
    type Msg = ManagerMsg;
    type State = ManagerState;
    type Arguments = ManagerArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let mut coordinator = Coordinator::new(args.profiles);
        let assignments = coordinator.assign_initial(args.workers_num);

        let mut workers: BTreeMap<WorkerId, WorkerSlot> = BTreeMap::new();
        for (worker_id, section) in assignments {
            let worker_args = WorkerArguments {
                worker_id,
                run_id: args.run_id.clone(),
                manager: myself.clone(),
            };
            let spawned =
                Actor::spawn_linked(None, WorkerActor, worker_args, myself.get_cell()).await;
            let (actor, join) = match spawned {
                Ok(spawned) => spawned,
                Err(e) => {
                    tracing::error!(run_id = %args.run_id, worker_id = %worker_id, error = %e, "Failed to spawn worker");
                    kill_all(&workers);
                    return Err(SimulationError::Spawn(e.to_string()).into());
                }
            };

            let key = section.key();
            if let Err(e) = actor.cast(WorkerMsg::NewSection(NewSectionEvent { section })) {
                actor.kill();
                kill_all(&workers);
                return Err(SimulationError::Spawn(format!(
                    "{worker_id} refused section {key}: {e}"
                ))
                .into());
            }
            tracing::debug!(run_id = %args.run_id, worker_id = %worker_id, section = %key, "Assigned initial section");

            workers.insert(
                worker_id,
                WorkerSlot {
                    actor,
                    join: Some(join),
                },
            );
        }

        Ok(ManagerState {
            run_id: args.run_id,
            coordinator,
            workers,
            halt_timeout: args.halt_timeout,
            output: Some(args.output),
        })
    }

    async fn post_start(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(
            run_id = %state.run_id,
            workers = state.workers.len(),
            profiles = state.coordinator.status(&state.run_id).total_profiles,
            "Manager started"
        );
        let directive = state.coordinator.start();
        self.apply(&myself, state, vec![directive]).await;
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ManagerMsg::WorkerReady(event) => {
                tracing::debug!(
                    run_id = %state.run_id,
                    worker_id = %event.worker_id,
                    day = event.day,
                    section_done = event.section.is_some(),
                    "Worker is ready"
                );
                match state.coordinator.on_worker_ready(event) {
                    Ok(directives) => self.apply(&myself, state, directives).await,
                    Err(e) => {
                        state.coordinator.abort();
                        self.finish(&myself, state, Err(e)).await;
                    }
                }
            }
            ManagerMsg::GetStatus { reply } => {
                let _ = reply.send(state.coordinator.status(&state.run_id));
            }
        }
        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        event: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (actor_id, failure) = match &event {
            SupervisionEvent::ActorFailed(actor_cell, failure) => {
                (actor_cell.get_id(), Some(failure.to_string()))
            }
            SupervisionEvent::ActorTerminated(actor_cell, _, _) => (actor_cell.get_id(), None),
            _ => return Ok(()),
        };

        let Some(worker_id) = find_worker(state, actor_id) else {
            return Ok(());
        };
        if let Some(slot) = state.workers.get_mut(&worker_id) {
            // Already gone, nothing to wait for when halting.
            slot.join = None;
        }
        if let Some(err) = state.coordinator.on_worker_lost(worker_id, failure) {
            self.finish(&myself, state, Err(err)).await;
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // Workers still running here means the manager was stopped from outside.
        self.halt_workers(state).await;
        tracing::debug!(run_id = %state.run_id, "Manager stopped");
        Ok(())
    }
}

impl ManagerActor {
    async fn apply(
        &self,
        myself: &ActorRef<ManagerMsg>,
        state: &mut ManagerState,
        directives: Vec<Directive>,
    ) {
        for directive in directives {
            let sent = match directive {
                Directive::Assign { worker_id, section } => {
                    tracing::debug!(
                        run_id = %state.run_id,
                        worker_id = %worker_id,
                        section = %section.key(),
                        "Reassigning worker"
                    );
                    send_to_worker(state, worker_id, WorkerMsg::NewSection(NewSectionEvent { section }))
                }
                Directive::Broadcast(day) => broadcast_day(state, day),
                Directive::Finish => {
                    let profiles = state.coordinator.take_profiles();
                    self.finish(myself, state, Ok(profiles)).await;
                    return;
                }
            };

            if let Err(e) = sent {
                state.coordinator.abort();
                self.finish(myself, state, Err(e)).await;
                return;
            }
        }
    }

    /// Halts every worker, publishes `outcome` and stops the manager.
    async fn finish(
        &self,
        myself: &ActorRef<ManagerMsg>,
        state: &mut ManagerState,
        outcome: SimulationOutput,
    ) {
        self.halt_workers(state).await;

        let reason = match &outcome {
            Ok(_) => {
                tracing::info!(
                    run_id = %state.run_id,
                    days = state.coordinator.current_day(),
                    "The wall is built"
                );
                "wall built".to_string()
            }
            Err(e) => {
                tracing::error!(run_id = %state.run_id, error = %e, "Simulation failed");
                format!("simulation failed: {e}")
            }
        };

        if let Some(output) = state.output.take() {
            if output.send(outcome).is_err() {
                tracing::debug!(run_id = %state.run_id, "Output receiver dropped");
            }
        }
        myself.stop(Some(reason));
    }

    /// Sends `Exit` to every worker still running and waits for all of them
    /// to stop. Workers still running once `halt_timeout` has passed are
    /// killed.
    async fn halt_workers(&self, state: &mut ManagerState) {
        for slot in state.workers.values() {
            if slot.join.is_some() {
                ExitEvent.send(&slot.actor);
            }
        }

        let deadline = tokio::time::Instant::now() + state.halt_timeout;
        for (worker_id, slot) in state.workers.iter_mut() {
            let Some(mut join) = slot.join.take() else {
                continue;
            };
            if tokio::time::timeout_at(deadline, &mut join).await.is_err() {
                tracing::warn!(
                    run_id = %state.run_id,
                    worker_id = %worker_id,
                    "Worker did not exit in time, killing it"
                );
                slot.actor.kill();
                let _ = join.await;
            }
        }
    }
}

fn kill_all(workers: &BTreeMap<WorkerId, WorkerSlot>) {
    for slot in workers.values() {
        slot.actor.kill();
    }
}

fn find_worker(state: &ManagerState, actor_id: ActorId) -> Option<WorkerId> {
    state
        .workers
        .iter()
        .find(|(_, slot)| slot.actor.get_id() == actor_id)
        .map(|(worker_id, _)| *worker_id)
}

fn send_to_worker(
    state: &ManagerState,
    worker_id: WorkerId,
    message: WorkerMsg,
) -> Result<(), SimulationError> {
    let slot = state.workers.get(&worker_id).ok_or_else(|| {
        SimulationError::Protocol(format!("no running worker {worker_id}"))
    })?;
    slot.actor
        .cast(message)
        .map_err(|_| SimulationError::WorkerStopped { worker_id })
}

fn broadcast_day(state: &ManagerState, day: DayEvent) -> Result<(), SimulationError> {
    tracing::debug!(run_id = %state.run_id, day = day.day, "Broadcasting day");
    for worker_id in state.coordinator.worker_ids() {
        send_to_worker(state, worker_id, WorkerMsg::Day(day))?;
    }
    Ok(())
}
