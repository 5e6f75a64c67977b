//! SSH connection configuration and device credentials.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    /// This is the default and matches common SSH client behavior.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file. `None` uses the user's default.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Configuration with defaults for everything but host and identity.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            timeout: Duration::from_secs(20),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

/// Identity used to log in to a device and escalate privileges.
///
/// Secrets are held as [`SecretString`]: they never appear in `Debug`
/// output, logs, or serialized reports. Exposure happens only at the
/// channel write.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    login_secret: SecretString,
    enable_secret: Option<SecretString>,
}

impl Credentials {
    /// Create credentials with a username and login secret.
    pub fn new(username: impl Into<String>, login_secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            login_secret: SecretString::from(login_secret.into()),
            enable_secret: None,
        }
    }

    /// Attach a privilege-escalation secret.
    pub fn with_enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// The login username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The login secret.
    pub fn login_secret(&self) -> &SecretString {
        &self.login_secret
    }

    /// The privilege-escalation secret, if any.
    pub fn enable_secret(&self) -> Option<&SecretString> {
        self.enable_secret.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = SshConfig::new("10.0.0.1", "admin", AuthMethod::None);
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("prne", "cisco123!").with_enable_secret("class123!");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("cisco123!"));
        assert!(!rendered.contains("class123!"));
        assert!(rendered.contains("prne"));
    }
}
