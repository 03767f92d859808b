pub mod manager;
pub mod protocol;
pub mod worker;

pub use manager::{ManagerActor, ManagerArguments, SimulationOutput};
pub use protocol::{
    DayEvent, ExitEvent, ManagerMsg, ManagerStatus, NewSectionEvent, WorkerId, WorkerMsg,
    WorkerReadyEvent,
};
pub use worker::{WorkerActor, WorkerArguments, WorkerError};
