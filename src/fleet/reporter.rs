//! Injectable progress reporting.
//!
//! The runner never configures process-wide logging; it talks to a
//! [`Reporter`] handed in by the caller, so tests can capture progress
//! without touching global state.

use log::{error, info};

use super::report::RunRecord;

/// Receives per-device progress during a fleet run.
pub trait Reporter: Send + Sync {
    /// A device's drive is starting.
    fn device_started(&self, target: &str) {
        let _ = target;
    }

    /// A device's drive finished, successfully or not.
    fn device_finished(&self, record: &RunRecord);
}

/// Default reporter: forwards progress to the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn device_started(&self, target: &str) {
        info!("{}: starting", target);
    }

    fn device_finished(&self, record: &RunRecord) {
        match &record.error {
            None => info!(
                "{}: completed, {} command(s) captured",
                record.target,
                record.outputs.len()
            ),
            Some(failure) => error!(
                "{}: failed at {} ({:?}): {}",
                record.target, failure.step, failure.kind, failure.message
            ),
        }
    }
}
