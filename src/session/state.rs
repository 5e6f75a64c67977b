//! Session lifecycle states.

use std::fmt;

/// Where a session is in the login/command/teardown protocol.
///
/// `Closed` and `Failed` are absorbing: no transition leaves them. A channel
/// is held exactly while the state is live (see [`SessionState::is_live`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel yet.
    Disconnected,

    /// Channel attached, waiting for the first recognizable prompt.
    Connecting,

    /// Login secret prompt observed; secret sent, awaiting the shell prompt.
    AwaitingLoginSecret,

    /// Escalation secret prompt observed; secret sent, awaiting the
    /// privileged prompt.
    AwaitingPrivilegeSecret,

    /// At a shell prompt and accepting commands.
    Ready {
        /// Whether the session holds the privileged (`#`) prompt.
        privileged: bool,
    },

    /// Inside the configuration submode (a sub-state of Ready).
    ConfigSubmode,

    /// Closed deliberately. Absorbing.
    Closed,

    /// Terminated by a protocol error. Absorbing.
    Failed,
}

impl SessionState {
    /// Whether a channel is attached in this state.
    pub fn is_live(&self) -> bool {
        !matches!(
            self,
            SessionState::Disconnected | SessionState::Closed | SessionState::Failed
        )
    }

    /// Whether commands may be issued.
    pub fn accepts_commands(&self) -> bool {
        matches!(self, SessionState::Ready { .. } | SessionState::ConfigSubmode)
    }

    /// Whether this is an absorbing terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::AwaitingLoginSecret => "awaiting-login-secret",
            SessionState::AwaitingPrivilegeSecret => "awaiting-privilege-secret",
            SessionState::Ready { privileged: true } => "ready(privileged)",
            SessionState::Ready { privileged: false } => "ready",
            SessionState::ConfigSubmode => "config-submode",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness() {
        assert!(!SessionState::Disconnected.is_live());
        assert!(SessionState::Connecting.is_live());
        assert!(SessionState::Ready { privileged: true }.is_live());
        assert!(SessionState::ConfigSubmode.is_live());
        assert!(!SessionState::Closed.is_live());
        assert!(!SessionState::Failed.is_live());
    }

    #[test]
    fn test_accepts_commands() {
        assert!(SessionState::Ready { privileged: false }.accepts_commands());
        assert!(SessionState::ConfigSubmode.accepts_commands());
        assert!(!SessionState::AwaitingLoginSecret.accepts_commands());
    }
}
