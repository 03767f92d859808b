//! ManagerActor - coordinates wall construction across worker actors
//!
//! The manager owns every profile. Sections leave its pool only inside a
//! `NewSection` message and come back only inside a `WorkerReady` message.
//!
//! ## Day Barrier
//!
//! ```text
//! broadcast Day(N) --> every active worker replies WorkerReady(N)
//!        ^                               |
//!        +---------- all replied --------+
//! ```
//!
//! A reply carrying a completed section is recorded first; the freed worker
//! immediately gets the next unclaimed section (profile id, then section id
//! order). Once every profile is completed the workers are halted and the
//! wall is published on the output channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (output, result) = tokio::sync::oneshot::channel();
//! let args = ManagerArguments { run_id, profiles, workers_num: 4, halt_timeout, output };
//! let (manager_ref, _handle) = Actor::spawn(None, ManagerActor, args).await?;
//! let wall = result.await??;
//! ```

pub mod actor;
pub mod barrier;
pub mod state;

pub use actor::{ManagerActor, ManagerArguments, ManagerState, SimulationOutput};
pub use barrier::{BarrierError, DayBarrier};
pub use state::{Coordinator, Directive};
