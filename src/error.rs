//! Error types for fleetspect.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::session::SessionState;

/// Main error type for fleetspect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session protocol errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration comparison errors
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),
}

impl Error {
    /// Classify this error for per-device result records.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(e) => match e {
                TransportError::AuthenticationFailed { .. } => ErrorKind::Authentication,
                _ => ErrorKind::Connection,
            },
            Error::Channel(e) => match e {
                ChannelError::PatternTimeout(_) => ErrorKind::ProtocolTimeout,
                ChannelError::Closed => ErrorKind::EndOfStream,
                _ => ErrorKind::Connection,
            },
            Error::Session(e) => match e {
                SessionError::AlreadyOpen | SessionError::NotReady { .. } => {
                    ErrorKind::SessionNotReady
                }
                SessionError::ProtocolTimeout { .. } => ErrorKind::ProtocolTimeout,
                SessionError::UnexpectedEof { .. } => ErrorKind::EndOfStream,
                SessionError::AuthenticationRejected { .. }
                | SessionError::MissingEnableSecret => ErrorKind::Authentication,
                SessionError::CommandTimeout { .. } => ErrorKind::CommandTimeout,
                SessionError::CommandRejected { .. } => ErrorKind::CommandRejected,
            },
            Error::Compare(_) => ErrorKind::ComparisonIo,
        }
    }
}

/// Coarse failure classification carried in per-device result records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport unreachable or handshake rejected.
    Connection,
    /// Login or privilege-escalation secret rejected.
    Authentication,
    /// An expected pattern never observed within budget.
    ProtocolTimeout,
    /// Remote closed the stream unexpectedly.
    EndOfStream,
    /// Command issued but the prompt never returned.
    CommandTimeout,
    /// API misuse: operation issued outside the Ready state.
    SessionNotReady,
    /// A configuration step was rejected by the device.
    CommandRejected,
    /// Policy or baseline file unreadable.
    ComparisonIo,
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key for a known host has changed
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host key is unknown and verification is strict
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file error
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, stream operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("No candidate pattern found within {0:?}")]
    PatternTimeout(Duration),

    /// Stream ended before a candidate matched
    #[error("Channel closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session protocol errors (login sequence, privilege escalation,
/// command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session already has a live channel
    #[error("Session already open")]
    AlreadyOpen,

    /// Operation requires a Ready session
    #[error("Session not ready (state: {state})")]
    NotReady { state: SessionState },

    /// An expected pattern never arrived
    #[error("Timed out in state {state} waiting for {waiting_for}")]
    ProtocolTimeout {
        state: SessionState,
        waiting_for: String,
    },

    /// The remote closed the stream mid-protocol
    #[error("Stream ended in state {state}")]
    UnexpectedEof { state: SessionState },

    /// A secret was sent but the expected prompt never followed
    #[error("Authentication rejected during {step}")]
    AuthenticationRejected { step: String },

    /// Privilege escalation requested without an enable secret
    #[error("No privilege-escalation secret supplied")]
    MissingEnableSecret,

    /// Command issued but the prompt never returned
    #[error("Command timed out: {command}")]
    CommandTimeout { command: String },

    /// The device rejected a configuration step
    #[error("Command rejected: {command}: {message}")]
    CommandRejected { command: String, message: String },
}

/// Configuration comparison errors.
#[derive(Error, Debug)]
pub enum CompareError {
    /// Policy or baseline file unreadable
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using fleetspect's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        let err = Error::from(ChannelError::PatternTimeout(Duration::from_secs(5)));
        assert_eq!(err.kind(), ErrorKind::ProtocolTimeout);

        let err = Error::from(ChannelError::Closed);
        assert_eq!(err.kind(), ErrorKind::EndOfStream);

        let err = Error::from(SessionError::AuthenticationRejected {
            step: "login".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let err = Error::from(SessionError::CommandTimeout {
            command: "show version".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::CommandTimeout);

        let err = Error::from(SessionError::NotReady {
            state: SessionState::Disconnected,
        });
        assert_eq!(err.kind(), ErrorKind::SessionNotReady);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ProtocolTimeout).unwrap();
        assert_eq!(json, "\"protocol_timeout\"");
    }
}
