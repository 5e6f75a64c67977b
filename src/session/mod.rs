//! Session layer: the login state machine and command execution.
//!
//! A [`Session`] drives one device through the login protocol and owns its
//! channel for the whole connection; a [`CommandExecutor`] issues commands
//! against a Ready session and returns [`CapturedOutput`].

mod executor;
mod machine;
mod response;
mod state;

pub use executor::CommandExecutor;
pub use machine::Session;
pub use response::CapturedOutput;
pub use state::SessionState;
