//! WorkerActor - builds one wall section at a time
//!
//! ## State Machine
//!
//! ```text
//! Idle --NewSection--> Holding --Day (section completed)--> Idle
//!   any --Exit (stop signal)--> Stopped
//! ```
//!
//! Every `Day` is answered with exactly one `WorkerReady`, also while idle,
//! so an idle worker never holds the day barrier back.

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use wall_types::{Section, SectionKey};

use crate::actors::protocol::{
    DayEvent, ExitEvent, ManagerMsg, NewSectionEvent, WorkerId, WorkerMsg, WorkerReadyEvent,
};

#[derive(Debug, Default)]
pub struct WorkerActor;

#[derive(Debug, Clone)]
pub struct WorkerArguments {
    pub worker_id: WorkerId,
    pub run_id: String,
    pub manager: ActorRef<ManagerMsg>,
}

pub struct WorkerState {
    worker_id: WorkerId,
    run_id: String,
    manager: ActorRef<ManagerMsg>,
    held: Option<Section>,
}

/// Errors that stop a worker
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("{worker_id} already holds section {held}, refused {offered}")]
    AlreadyHolding {
        worker_id: WorkerId,
        held: SectionKey,
        offered: SectionKey,
    },
}

#[async_trait]
impl Actor for WorkerActor {
    type Msg = WorkerMsg;
    type State = WorkerState;
    type Arguments = WorkerArguments;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!(run_id = %args.run_id, worker_id = %args.worker_id, "Worker started");
        Ok(WorkerState {
            worker_id: args.worker_id,
            run_id: args.run_id,
            manager: args.manager,
            held: None,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMsg::NewSection(NewSectionEvent { section }) => {
                if let Some(held) = &state.held {
                    return Err(WorkerError::AlreadyHolding {
                        worker_id: state.worker_id,
                        held: held.key(),
                        offered: section.key(),
                    }
                    .into());
                }
                tracing::debug!(
                    run_id = %state.run_id,
                    worker_id = %state.worker_id,
                    section = %section.key(),
                    height = section.height(),
                    "Picked up new section"
                );
                state.held = Some(section);
            }
            WorkerMsg::Day(DayEvent { day }) => {
                let section = build_held_section(state, day);
                let ready = WorkerReadyEvent {
                    worker_id: state.worker_id,
                    day,
                    section,
                };
                if let Err(e) = state.manager.cast(ManagerMsg::WorkerReady(ready)) {
                    // Nobody left to report to, same as an exit request.
                    tracing::debug!(
                        run_id = %state.run_id,
                        worker_id = %state.worker_id,
                        day,
                        error = %e,
                        "Manager is gone"
                    );
                    myself.stop(Some(ExitEvent::REASON.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::debug!(run_id = %state.run_id, worker_id = %state.worker_id, "Worker quit");
        if let Some(section) = &state.held {
            tracing::warn!(
                run_id = %state.run_id,
                worker_id = %state.worker_id,
                section = %section.key(),
                "Worker stopped while holding a section"
            );
        }
        Ok(())
    }
}

/// Builds one step of the held section. Hands the section back once it is
/// completed.
fn build_held_section(state: &mut WorkerState, day: u32) -> Option<Section> {
    let section = state.held.as_mut()?;
    section.build_step(day);
    if !section.is_completed() {
        return None;
    }

    let section = state.held.take()?;
    let steps: Vec<u32> = section.history().iter().map(|step| step.height).collect();
    tracing::info!(
        run_id = %state.run_id,
        worker_id = %state.worker_id,
        day,
        profile_id = %section.profile_id(),
        section_id = %section.section_id(),
        steps = ?steps,
        "Section is ready"
    );
    Some(section)
}
