//! Manager supervision tests
//!
//! These tests drive ManagerActor directly:
//! - A worker that dies before the wall is built ends the run with an error
//! - A reply that breaks the day barrier is published as a protocol error
//! - Stopping the manager from outside stops every worker it started

use std::time::Duration;

use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorRef, ActorStatus};
use tokio::sync::oneshot;
use tokio::time::timeout;
use wall_sim::actors::{
    ManagerActor, ManagerArguments, ManagerMsg, SimulationOutput, WorkerId, WorkerReadyEvent,
};
use wall_sim::{Profile, ProfileId, SimulationError};

const TEST_DEADLINE: Duration = Duration::from_secs(10);

/// A wall that takes thousands of days to build.
fn large_wall() -> Vec<Profile> {
    (1..=100)
        .map(|id| Profile::new(ProfileId(id), &[0; 10]).unwrap())
        .collect()
}

async fn spawn_manager(
    workers_num: usize,
) -> (
    ActorRef<ManagerMsg>,
    JoinHandle<()>,
    oneshot::Receiver<SimulationOutput>,
) {
    let (output, result) = oneshot::channel();
    let args = ManagerArguments {
        run_id: "supervision-test".to_string(),
        profiles: large_wall(),
        workers_num,
        halt_timeout: Duration::from_millis(500),
        output,
    };
    let (manager, handle) = Actor::spawn(None, ManagerActor, args)
        .await
        .expect("Failed to spawn manager");
    (manager, handle, result)
}

#[tokio::test]
async fn test_killed_worker_ends_the_run() {
    let (manager, handle, result) = spawn_manager(3).await;

    let workers = manager.get_children();
    assert_eq!(workers.len(), 3);
    workers[0].kill();

    let outcome = timeout(TEST_DEADLINE, result)
        .await
        .expect("manager never published")
        .expect("output channel closed");
    match outcome {
        Err(SimulationError::WorkerStopped { .. }) | Err(SimulationError::WorkerFailed { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("wall reported built after a worker died"),
    }

    timeout(TEST_DEADLINE, handle)
        .await
        .expect("manager did not stop")
        .unwrap();
    for worker in &workers {
        assert!(matches!(worker.get_status(), ActorStatus::Stopped));
    }
}

#[tokio::test]
async fn test_reply_from_unknown_worker_is_a_protocol_error() {
    let (manager, handle, result) = spawn_manager(2).await;

    manager
        .cast(ManagerMsg::WorkerReady(WorkerReadyEvent {
            worker_id: WorkerId(99),
            day: 1,
            section: None,
        }))
        .unwrap();

    let outcome = timeout(TEST_DEADLINE, result)
        .await
        .expect("manager never published")
        .expect("output channel closed");
    assert!(matches!(outcome, Err(SimulationError::Protocol(_))));

    timeout(TEST_DEADLINE, handle)
        .await
        .expect("manager did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_stopping_manager_stops_its_workers() {
    let (manager, handle, result) = spawn_manager(4).await;
    let workers = manager.get_children();
    assert_eq!(workers.len(), 4);

    manager.stop(Some("test stop".to_string()));
    timeout(TEST_DEADLINE, handle)
        .await
        .expect("manager did not stop")
        .unwrap();

    for worker in &workers {
        assert!(matches!(worker.get_status(), ActorStatus::Stopped));
    }
    // Stopped from outside: nothing is published, the channel just closes.
    assert!(result.await.is_err());
}
