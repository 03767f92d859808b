//! Ice usage and cost of a built wall
//!
//! Every section that grows on a day uses `ICE_VOLUME_PER_DAY` cubic yards
//! of ice, each cubic yard costs `ICE_UNIT_COST` gold.

use chrono::{DateTime, Utc};
use serde::Serialize;
use wall_types::{HeightStep, Profile, ProfileId, SectionId};

/// Cubic yards of ice one section uses per day of work
pub const ICE_VOLUME_PER_DAY: u64 = 195;

/// Gold per cubic yard of ice
pub const ICE_UNIT_COST: u64 = 1900;

fn sections_worked(profile: &Profile, day: u32) -> u64 {
    profile
        .sections()
        .filter(|section| section.worked_on(day))
        .count() as u64
}

fn build_steps(profile: &Profile) -> u64 {
    profile
        .sections()
        .map(|section| section.history().len().saturating_sub(1) as u64)
        .sum()
}

/// Ice used by `profile` on `day`, `None` when no section grew that day.
pub fn profile_daily_ice_volume(profile: &Profile, day: u32) -> Option<u64> {
    match sections_worked(profile, day) {
        0 => None,
        worked => Some(worked * ICE_VOLUME_PER_DAY),
    }
}

pub fn profile_daily_cost(profile: &Profile, day: u32) -> Option<u64> {
    profile_daily_ice_volume(profile, day).map(|volume| volume * ICE_UNIT_COST)
}

/// Cost of `day` across the whole wall, `None` when nothing grew that day.
pub fn wall_daily_cost(profiles: &[Profile], day: u32) -> Option<u64> {
    match profiles.iter().map(|p| sections_worked(p, day)).sum::<u64>() {
        0 => None,
        worked => Some(worked * ICE_VOLUME_PER_DAY * ICE_UNIT_COST),
    }
}

/// Cost of every build step of the whole wall
pub fn total_cost(profiles: &[Profile]) -> u64 {
    profiles.iter().map(build_steps).sum::<u64>() * ICE_VOLUME_PER_DAY * ICE_UNIT_COST
}

/// Last day any section grew
pub fn days_elapsed(profiles: &[Profile]) -> u32 {
    profiles
        .iter()
        .flat_map(|profile| profile.sections())
        .filter_map(|section| section.history().last())
        .map(|step| step.day)
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SectionReport {
    pub section_id: SectionId,
    pub history: Vec<HeightStep>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProfileReport {
    pub profile_id: ProfileId,
    pub ice_volume: u64,
    pub cost: u64,
    pub sections: Vec<SectionReport>,
}

/// Final state of one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct WallReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub days_elapsed: u32,
    pub total_cost: u64,
    pub profiles: Vec<ProfileReport>,
}

impl WallReport {
    pub fn build(
        run_id: impl Into<String>,
        profiles: &[Profile],
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let profile_reports = profiles
            .iter()
            .map(|profile| {
                let ice_volume = build_steps(profile) * ICE_VOLUME_PER_DAY;
                ProfileReport {
                    profile_id: profile.profile_id(),
                    ice_volume,
                    cost: ice_volume * ICE_UNIT_COST,
                    sections: profile
                        .sections()
                        .map(|section| SectionReport {
                            section_id: section.section_id(),
                            history: section.history().to_vec(),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            run_id: run_id.into(),
            started_at,
            finished_at,
            days_elapsed: days_elapsed(profiles),
            total_cost: total_cost(profiles),
            profiles: profile_reports,
        }
    }
}
