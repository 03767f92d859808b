use std::path::PathBuf;
use std::time::Duration;

use crate::simulation::SimulationConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Number of worker teams
    pub workers: usize,
    /// File with one profile of initial heights per line
    pub profiles_file: PathBuf,
    /// Deadline for the whole simulation
    pub run_timeout: Duration,
    /// How long the manager waits for each worker to exit
    pub halt_timeout: Duration,
    /// Where to write the JSON report, stdout when unset
    pub report_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let workers: usize = env_parse(&lookup, "WALL_WORKERS", 2)?;
        if workers == 0 {
            anyhow::bail!("WALL_WORKERS must be positive");
        }

        Ok(Self {
            workers,
            profiles_file: PathBuf::from(env_str(&lookup, "WALL_PROFILES_FILE", "profiles.txt")),
            run_timeout: Duration::from_secs(env_parse(&lookup, "WALL_RUN_TIMEOUT_SECS", 60)?),
            halt_timeout: Duration::from_millis(env_parse(
                &lookup,
                "WALL_HALT_TIMEOUT_MS",
                2000,
            )?),
            report_path: lookup("WALL_REPORT_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            workers_num: self.workers,
            halt_timeout: self.halt_timeout,
        }
    }
}

fn env_str(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.profiles_file, PathBuf::from("profiles.txt"));
        assert_eq!(config.run_timeout, Duration::from_secs(60));
        assert_eq!(config.halt_timeout, Duration::from_millis(2000));
        assert!(config.report_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("WALL_WORKERS", "20"),
            ("WALL_PROFILES_FILE", "/tmp/wall.txt"),
            ("WALL_RUN_TIMEOUT_SECS", "5"),
            ("WALL_HALT_TIMEOUT_MS", "250"),
            ("WALL_REPORT_PATH", "report.json"),
        ])
        .unwrap();

        assert_eq!(config.workers, 20);
        assert_eq!(config.profiles_file, PathBuf::from("/tmp/wall.txt"));
        assert_eq!(config.run_timeout, Duration::from_secs(5));
        assert_eq!(config.report_path, Some(PathBuf::from("report.json")));

        let simulation = config.simulation();
        assert_eq!(simulation.workers_num, 20);
        assert_eq!(simulation.halt_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("WALL_WORKERS", "many")]).is_err());
        assert!(config_from(&[("WALL_WORKERS", "0")]).is_err());
        assert!(config_from(&[("WALL_RUN_TIMEOUT_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_blank_report_path_means_stdout() {
        let config = config_from(&[("WALL_REPORT_PATH", "  ")]).unwrap();
        assert!(config.report_path.is_none());
    }
}
