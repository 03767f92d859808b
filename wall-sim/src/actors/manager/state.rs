//! ManagerActor coordination state
//!
//! Pure bookkeeping with no actor handles in it: the actor feeds events in
//! and carries out the returned directives, in order.

use std::collections::BTreeMap;

use wall_types::{Profile, Section, SectionKey};

use crate::actors::manager::barrier::DayBarrier;
use crate::actors::protocol::{DayEvent, ManagerStatus, WorkerId, WorkerReadyEvent};
use crate::error::SimulationError;

/// What the manager actor has to do next
#[derive(Debug)]
pub enum Directive {
    /// Send `NewSection` to one worker
    Assign { worker_id: WorkerId, section: Section },
    /// Send `Day` to every active worker
    Broadcast(DayEvent),
    /// The wall is built: halt workers and publish
    Finish,
}

pub struct Coordinator {
    profiles: Vec<Profile>,
    barrier: DayBarrier,
    /// Active workers and the section each one holds
    workers: BTreeMap<WorkerId, Option<SectionKey>>,
    finished: bool,
}

impl Coordinator {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles,
            barrier: DayBarrier::new(0),
            workers: BTreeMap::new(),
            finished: false,
        }
    }

    /// Hands one section to each worker slot in turn. Slots left without a
    /// section get no worker at all.
    pub fn assign_initial(&mut self, workers_num: usize) -> Vec<(WorkerId, Section)> {
        let mut assignments = Vec::new();
        if self.is_completed() {
            return assignments;
        }

        for slot in 1..=workers_num {
            let Some(section) = self.claim_next_section() else {
                break;
            };
            let worker_id = WorkerId(slot);
            self.workers.insert(worker_id, Some(section.key()));
            assignments.push((worker_id, section));
        }
        self.barrier = DayBarrier::new(self.workers.len());
        assignments
    }

    /// First directive after startup assignment.
    pub fn start(&mut self) -> Directive {
        if self.is_completed() {
            self.finished = true;
            return Directive::Finish;
        }
        Directive::Broadcast(self.barrier.open_next_day())
    }

    pub fn on_worker_ready(
        &mut self,
        event: WorkerReadyEvent,
    ) -> Result<Vec<Directive>, SimulationError> {
        if self.finished {
            return Ok(Vec::new());
        }

        let WorkerReadyEvent {
            worker_id,
            day,
            section,
        } = event;
        let held = *self.workers.get(&worker_id).ok_or_else(|| {
            SimulationError::Protocol(format!("day {day} acknowledged by unknown {worker_id}"))
        })?;
        let released = self
            .barrier
            .acknowledge(worker_id, day)
            .map_err(|e| SimulationError::Protocol(e.to_string()))?;

        let mut directives = Vec::new();
        if let Some(section) = section {
            let key = section.key();
            if held != Some(key) {
                return Err(SimulationError::Protocol(format!(
                    "{worker_id} returned section {key} it was not assigned"
                )));
            }
            self.restore(section)?;
            self.workers.insert(worker_id, None);

            if self.is_completed() {
                self.finished = true;
                return Ok(vec![Directive::Finish]);
            }

            if let Some(next) = self.claim_next_section() {
                self.workers.insert(worker_id, Some(next.key()));
                directives.push(Directive::Assign {
                    worker_id,
                    section: next,
                });
            }
        }

        if released {
            directives.push(Directive::Broadcast(self.barrier.open_next_day()));
        }
        Ok(directives)
    }

    /// A worker went away. Fatal while the wall is unfinished: whatever it
    /// held is lost and the barrier can no longer be satisfied.
    pub fn on_worker_lost(
        &mut self,
        worker_id: WorkerId,
        failure: Option<String>,
    ) -> Option<SimulationError> {
        if self.finished || !self.workers.contains_key(&worker_id) {
            return None;
        }

        self.finished = true;
        Some(match failure {
            Some(reason) => SimulationError::WorkerFailed { worker_id, reason },
            None => SimulationError::WorkerStopped { worker_id },
        })
    }

    pub fn abort(&mut self) {
        self.finished = true;
    }

    pub fn is_completed(&self) -> bool {
        self.profiles.iter().all(Profile::is_completed)
    }

    pub fn current_day(&self) -> u32 {
        self.barrier.current_day()
    }

    pub fn worker_ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.keys().copied()
    }

    pub fn status(&self, run_id: &str) -> ManagerStatus {
        ManagerStatus {
            run_id: run_id.to_string(),
            current_day: self.barrier.current_day(),
            active_workers: self.workers.len(),
            sections_on_loan: self.workers.values().filter(|held| held.is_some()).count(),
            completed_profiles: self.profiles.iter().filter(|p| p.is_completed()).count(),
            total_profiles: self.profiles.len(),
            finished: self.finished,
        }
    }

    /// Moves the profiles out for publishing.
    pub fn take_profiles(&mut self) -> Vec<Profile> {
        std::mem::take(&mut self.profiles)
    }

    fn claim_next_section(&mut self) -> Option<Section> {
        self.profiles
            .iter_mut()
            .find_map(Profile::claim_next_available)
    }

    fn restore(&mut self, section: Section) -> Result<(), SimulationError> {
        let key = section.key();
        let profile = self
            .profiles
            .iter_mut()
            .find(|p| p.profile_id() == key.profile_id)
            .ok_or_else(|| SimulationError::Protocol(format!("section {key} has no profile")))?;
        profile
            .restore(section)
            .map_err(|e| SimulationError::Protocol(e.to_string()))
    }
}
