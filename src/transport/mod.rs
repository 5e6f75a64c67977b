//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management,
//! handling connection setup, authentication, and shell channel creation.

pub mod config;
mod ssh;

pub use config::{AuthMethod, Credentials, HostKeyVerification, SshConfig};
pub use ssh::{SshStream, SshTransport};
