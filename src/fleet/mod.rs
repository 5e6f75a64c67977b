//! Fleet layer: driving many devices with per-target fault isolation.

mod inventory;
mod report;
mod reporter;
mod runner;

pub use inventory::{load_inventory, parse_inventory};
pub use report::{FailureReport, FleetReport, RunRecord};
pub use reporter::{LogReporter, Reporter};
pub use runner::{Connector, DeviceTarget, FleetRunner, SshConnector};
