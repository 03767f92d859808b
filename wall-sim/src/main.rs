use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wall_sim::config::Config;
use wall_sim::profile_file::load_profiles;
use wall_sim::report::WallReport;
use wall_sim::WallSimulation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "wall_sim=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.profiles_file = PathBuf::from(path);
    }
    tracing::info!(
        workers = config.workers,
        profiles_file = %config.profiles_file.display(),
        "wall-sim starting"
    );

    let heights = load_profiles(&config.profiles_file)?;
    let simulation = WallSimulation::new(&heights, config.simulation())?;
    let run_id = simulation.run_id().to_string();

    let started_at = chrono::Utc::now();
    let profiles = simulation.run_with_timeout(config.run_timeout).await?;
    let report = WallReport::build(run_id, &profiles, started_at, chrono::Utc::now());
    tracing::info!(
        run_id = %report.run_id,
        days = report.days_elapsed,
        total_cost = report.total_cost,
        "Simulation finished"
    );

    let json = serde_json::to_string_pretty(&report)?;
    match &config.report_path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
