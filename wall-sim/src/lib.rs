//! Wall simulation - actor-based construction of a wall of profiles
//!
//! A `ManagerActor` owns the wall and lends one section at a time to each
//! `WorkerActor`. Days advance in lockstep: a new day is broadcast only after
//! every active worker has reported on the previous one.

pub mod actors;
pub mod config;
pub mod error;
pub mod profile_file;
pub mod report;
pub mod simulation;

pub use error::SimulationError;
pub use simulation::{SimulationConfig, SimulationHandle, WallSimulation};
pub use wall_types::{HeightStep, Profile, ProfileId, Section, SectionId, SectionKey};
