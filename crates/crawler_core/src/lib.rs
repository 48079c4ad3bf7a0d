//! Crawler core: pure fetch state machine, work units and archive layout.
mod effect;
mod msg;
mod outcome;
mod partition;
mod policy;
mod state;
mod unit;
mod update;

pub use effect::{Effect, Pause, Resolution};
pub use msg::Msg;
pub use outcome::Outcome;
pub use partition::{blob_file_name, blob_path, parse_blob_name, record_path, Partition};
pub use policy::{RetryPolicy, StorageFailurePolicy};
pub use state::UnitState;
pub use unit::{CveId, WorkUnit};
pub use update::update;
