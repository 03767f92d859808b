//! Profile file import
//!
//! One profile per non-blank line, initial heights separated by whitespace:
//!
//! ```text
//! 21 25 28
//! 17
//! 17 22 17 19 17
//! ```

use std::path::{Path, PathBuf};

use wall_types::{MAX_HEIGHT, MIN_HEIGHT};

#[derive(Debug, thiserror::Error)]
pub enum ProfileFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid height value given, profile id: [{profile_id}], value: [{value}]")]
    InvalidHeight { profile_id: usize, value: String },
}

/// Parses profile heights. Profile ids are 1-based over non-blank lines.
pub fn parse_profiles(input: &str) -> Result<Vec<Vec<u32>>, ProfileFileError> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

fn parse_line(profile_id: usize, line: &str) -> Result<Vec<u32>, ProfileFileError> {
    line.split_whitespace()
        .map(|token| match token.parse::<u32>() {
            Ok(height) if (MIN_HEIGHT..=MAX_HEIGHT).contains(&height) => Ok(height),
            _ => Err(ProfileFileError::InvalidHeight {
                profile_id,
                value: token.to_string(),
            }),
        })
        .collect()
}

pub fn load_profiles(path: &Path) -> Result<Vec<Vec<u32>>, ProfileFileError> {
    let input = std::fs::read_to_string(path).map_err(|source| ProfileFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profiles = parse_profiles(&input)?;
    tracing::info!(path = %path.display(), profiles = profiles.len(), "Loaded wall profiles");
    Ok(profiles)
}
