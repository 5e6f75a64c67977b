//! # Fleetspect
//!
//! Async session automation and configuration auditing for network device
//! fleets.
//!
//! Fleetspect drives interactive CLI sessions over SSH the way an operator
//! would: it waits for prompts, answers them, and captures everything in
//! between. On top of that it layers configuration diffing, hardening
//! compliance checks, and a fleet runner that works through a whole device
//! inventory with per-device fault isolation.
//!
//! ## Features
//!
//! - Async SSH sessions via russh (PTY + shell channel)
//! - Ordered candidate-pattern matching with earliest-match semantics
//! - Explicit login state machine: host-key confirmation, login secret,
//!   privilege escalation, configuration submode
//! - Command capture bounded by per-call prompt patterns
//! - Line diffs and hardening-policy compliance over captured configs
//! - Fleet runs with bounded concurrency, run-level timeouts, and
//!   per-target result records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fleetspect::{
//!     Credentials, DeviceTarget, FleetRunner, SshConnector, profile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fleetspect::Error> {
//!     let credentials = Credentials::new("admin", "secret")
//!         .with_enable_secret("enable-secret");
//!
//!     let target = DeviceTarget::new(
//!         "192.168.56.101",
//!         profile::lookup("cisco_ios").expect("built-in profile"),
//!         credentials,
//!     )
//!     .with_command("show version");
//!
//!     let runner = FleetRunner::new(Arc::new(SshConnector::default()));
//!     let report = runner.run(vec![target]).await;
//!
//!     print!("{}", report.summary());
//!     std::process::exit(if report.all_succeeded() { 0 } else { 1 });
//! }
//! ```

pub mod channel;
pub mod compare;
pub mod error;
pub mod fleet;
pub mod ops;
pub mod profile;
pub mod session;
pub mod transcript;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use channel::{Channel, ExpectMatch, ExpectSpec, Pattern};
pub use compare::{
    ComplianceReport, ConfigDocument, DiffResult, check_compliance, diff_lines, is_compliant,
};
pub use error::{Error, ErrorKind};
pub use fleet::{
    Connector, DeviceTarget, FleetReport, FleetRunner, LogReporter, Reporter, RunRecord,
    SshConnector,
};
pub use profile::DeviceProfile;
pub use session::{CapturedOutput, CommandExecutor, Session, SessionState};
pub use transport::{AuthMethod, Credentials, HostKeyVerification, SshConfig};
