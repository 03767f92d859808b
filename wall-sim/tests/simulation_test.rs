//! End-to-end simulation tests
//!
//! Every run is wrapped in a timeout so a stalled day barrier fails the test
//! instead of hanging it.

use std::time::Duration;

use tokio::time::timeout;
use wall_sim::report::{days_elapsed, total_cost, ICE_UNIT_COST, ICE_VOLUME_PER_DAY};
use wall_sim::{HeightStep, Profile, SimulationConfig, SimulationError, WallSimulation};
use wall_types::MAX_HEIGHT;

const TEST_DEADLINE: Duration = Duration::from_secs(10);

async fn run(heights: &[Vec<u32>], workers_num: usize) -> Vec<Profile> {
    let simulation = WallSimulation::new(heights, SimulationConfig::new(workers_num))
        .expect("valid simulation input");
    timeout(TEST_DEADLINE, simulation.run())
        .await
        .expect("simulation timed out")
        .expect("simulation failed")
}

fn history(profile: &Profile, section: usize) -> Vec<(u32, u32)> {
    profile
        .sections()
        .nth(section)
        .expect("section exists")
        .history()
        .iter()
        .map(|HeightStep { day, height }| (*day, *height))
        .collect()
}

fn height_sequences(profiles: &[Profile]) -> Vec<Vec<u32>> {
    profiles
        .iter()
        .flat_map(|profile| profile.sections())
        .map(|section| section.history().iter().map(|step| step.height).collect())
        .collect()
}

#[tokio::test]
async fn test_one_worker_per_section_builds_in_lockstep() {
    let profiles = run(&[vec![27, 28, 29, 30]], 4).await;

    assert_eq!(profiles.len(), 1);
    assert!(profiles[0].is_completed());
    assert_eq!(history(&profiles[0], 0), vec![(0, 27), (1, 28), (2, 29), (3, 30)]);
    assert_eq!(history(&profiles[0], 1), vec![(0, 28), (1, 29), (2, 30)]);
    assert_eq!(history(&profiles[0], 2), vec![(0, 29), (1, 30)]);
    assert_eq!(history(&profiles[0], 3), vec![(0, 30)]);
}

#[tokio::test]
async fn test_single_worker_is_reassigned_in_order() {
    let profiles = run(&[vec![17, 22, 17]], 1).await;
    let profile = &profiles[0];

    assert!(profile.is_completed());
    let steps: Vec<u32> = profile.sections().map(|s| s.steps_num()).collect();
    assert_eq!(steps, vec![13, 8, 13]);

    let last_days: Vec<u32> = profile
        .sections()
        .map(|s| s.history().last().map(|step| step.day).unwrap_or(0))
        .collect();
    assert_eq!(last_days, vec![13, 21, 34]);
    assert_eq!(days_elapsed(&profiles), 34);

    for section in profile.sections() {
        assert_eq!(section.height(), MAX_HEIGHT);
    }
}

#[tokio::test]
async fn test_height_sequences_do_not_depend_on_worker_count() {
    let heights = vec![vec![21, 25, 28], vec![17], vec![17, 22, 17, 19, 17]];

    let solo = run(&heights, 1).await;
    let crew = run(&heights, 3).await;
    let crowd = run(&heights, 20).await;

    assert_eq!(height_sequences(&solo), height_sequences(&crew));
    assert_eq!(height_sequences(&solo), height_sequences(&crowd));
    assert_eq!(total_cost(&solo), total_cost(&crowd));

    for sequence in height_sequences(&crew) {
        let expected: Vec<u32> = (sequence[0]..=MAX_HEIGHT).collect();
        assert_eq!(sequence, expected);
    }
}

#[tokio::test]
async fn test_enough_workers_means_solo_trajectories() {
    let heights = vec![vec![21, 25, 28], vec![17], vec![0, 30]];
    let profiles = run(&heights, 10).await;

    for (profile, initial) in profiles.iter().zip(&heights) {
        for (section, &initial_height) in profile.sections().zip(initial) {
            let expected: Vec<HeightStep> = (initial_height..=MAX_HEIGHT)
                .map(|height| HeightStep {
                    day: height - initial_height,
                    height,
                })
                .collect();
            assert_eq!(section.history(), expected.as_slice());
        }
    }
    assert_eq!(days_elapsed(&profiles), 30);
}

#[tokio::test]
async fn test_cost_of_a_built_wall() {
    let profiles = run(&[vec![21, 25, 28], vec![17]], 2).await;
    let steps = (30 - 21) + (30 - 25) + (30 - 28) + (30 - 17);

    assert_eq!(total_cost(&profiles), steps * ICE_VOLUME_PER_DAY * ICE_UNIT_COST);
}

#[tokio::test]
async fn test_already_complete_wall_finishes_immediately() {
    let profiles = run(&[vec![30, 30], vec![30]], 3).await;

    assert!(profiles.iter().all(Profile::is_completed));
    assert_eq!(history(&profiles[0], 0), vec![(0, 30)]);
    assert_eq!(history(&profiles[1], 0), vec![(0, 30)]);
    assert_eq!(days_elapsed(&profiles), 0);
}

#[test]
fn test_empty_profiles_are_rejected() {
    let heights: Vec<Vec<u32>> = Vec::new();
    let err = WallSimulation::new(&heights, SimulationConfig::new(2)).unwrap_err();
    assert!(matches!(err, SimulationError::EmptyProfiles));
}

#[test]
fn test_zero_workers_are_rejected() {
    let err = WallSimulation::new(&[vec![1]], SimulationConfig::new(0)).unwrap_err();
    assert!(matches!(err, SimulationError::NoWorkers));
}

#[test]
fn test_height_above_max_is_rejected() {
    let err = WallSimulation::new(&[vec![1], vec![12, 31]], SimulationConfig::new(1)).unwrap_err();
    match err {
        SimulationError::InvalidProfile { profile_id, .. } => assert_eq!(profile_id.0, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_status_of_a_running_simulation() {
    let heights: Vec<Vec<u32>> = (0..200).map(|_| vec![0; 10]).collect();
    let simulation = WallSimulation::new(&heights, SimulationConfig::new(1)).unwrap();
    let run_id = simulation.run_id().to_string();

    let handle = simulation.start().await.unwrap();
    assert_eq!(handle.run_id(), run_id);

    let status = handle.status().await.unwrap();
    assert_eq!(status.run_id, run_id);
    assert_eq!(status.total_profiles, 200);
    assert_eq!(status.active_workers, 1);
    assert_eq!(status.sections_on_loan, 1);
    assert!(!status.finished);

    let err = handle.wait_timeout(Duration::from_millis(1)).await.unwrap_err();
    assert!(matches!(err, SimulationError::Timeout(_)));
}

#[tokio::test]
async fn test_deadline_stops_the_simulation() {
    let heights: Vec<Vec<u32>> = (0..1000).map(|_| vec![0; 10]).collect();
    let simulation = WallSimulation::new(&heights, SimulationConfig::new(2)).unwrap();

    let result = timeout(
        TEST_DEADLINE,
        simulation.run_with_timeout(Duration::from_millis(5)),
    )
    .await
    .expect("deadline was not enforced");

    match result {
        Err(SimulationError::Timeout(deadline)) => {
            assert_eq!(deadline, Duration::from_millis(5))
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_simulations_are_independent() {
    let first = WallSimulation::new(&[vec![29]], SimulationConfig::new(1)).unwrap();
    let second = WallSimulation::new(&[vec![28]], SimulationConfig::new(1)).unwrap();
    assert_ne!(first.run_id(), second.run_id());

    let (a, b) = tokio::join!(
        timeout(TEST_DEADLINE, first.run()),
        timeout(TEST_DEADLINE, second.run())
    );
    assert_eq!(history(&a.unwrap().unwrap()[0], 0), vec![(0, 29), (1, 30)]);
    assert_eq!(history(&b.unwrap().unwrap()[0], 0), vec![(0, 28), (1, 29), (2, 30)]);
}
