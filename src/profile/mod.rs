//! Device profiles: the prompt vocabulary and mode commands of a device
//! family.
//!
//! A profile is plain data consumed by the session state machine: which
//! prompts announce each login stage, how to escalate privileges, how to
//! enter and leave the configuration submode, and which output substrings
//! mean a command was rejected. Profiles are resolved with [`lookup`], a
//! pure function, no global registry.

pub mod cisco_ios;

use std::time::Duration;

use crate::channel::Pattern;

/// Prompt vocabulary and mode commands for one device family.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Profile name (e.g. "cisco_ios").
    pub name: String,

    /// Transport-level prompt asking to trust a new host key, if the
    /// transport surfaces one in-stream.
    pub host_key_prompt: Option<Pattern>,

    /// Reply sent when the host-key prompt is observed.
    pub host_key_reply: String,

    /// Username prompt, for transports that ask in-stream (telnet-style).
    pub username_prompt: Option<Pattern>,

    /// Prompt announcing the login secret is expected.
    pub login_secret_prompt: Pattern,

    /// Unprivileged prompt marker.
    pub user_prompt: Pattern,

    /// Privileged prompt marker.
    pub privileged_prompt: Pattern,

    /// Command that requests privilege escalation.
    pub escalate_command: String,

    /// Prompt announcing the escalation secret is expected.
    pub escalate_secret_prompt: Pattern,

    /// Command that enters the configuration submode.
    pub config_enter_command: String,

    /// Command that leaves the configuration submode.
    pub config_exit_command: String,

    /// Config-prompt pattern used when the device hostname is unknown.
    pub config_prompt_fallback: Pattern,

    /// Suffix appended to a known hostname to form the exact config prompt
    /// (e.g. `"(config)#"` yields `R1(config)#`).
    pub config_prompt_suffix: String,

    /// Command persisting the running configuration, if the family has one.
    pub save_command: Option<String>,

    /// Command sent before closing the channel, if any.
    pub logout_command: Option<String>,

    /// Commands run once the session is Ready (e.g. disable paging).
    pub on_open_commands: Vec<String>,

    /// Output substrings that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Default timeout for every expect step.
    pub timeout: Duration,
}

impl DeviceProfile {
    /// Create a profile with placeholder prompts; callers are expected to
    /// override the vocabulary via the builder methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_key_prompt: None,
            host_key_reply: "yes".to_string(),
            username_prompt: None,
            login_secret_prompt: Pattern::literal("Password:"),
            user_prompt: Pattern::literal(">"),
            privileged_prompt: Pattern::literal("#"),
            escalate_command: "enable".to_string(),
            escalate_secret_prompt: Pattern::literal("Password:"),
            config_enter_command: "configure terminal".to_string(),
            config_exit_command: "end".to_string(),
            config_prompt_fallback: Pattern::Regex(
                regex::bytes::Regex::new(r"\(config[^)]*\)#").expect("static pattern"),
            ),
            config_prompt_suffix: "(config)#".to_string(),
            save_command: None,
            logout_command: None,
            on_open_commands: vec![],
            failed_when_contains: vec![],
            timeout: Duration::from_secs(20),
        }
    }

    /// Set the host-key confirmation prompt and affirmative reply.
    pub fn with_host_key_prompt(mut self, pattern: Pattern, reply: impl Into<String>) -> Self {
        self.host_key_prompt = Some(pattern);
        self.host_key_reply = reply.into();
        self
    }

    /// Set the in-stream username prompt.
    pub fn with_username_prompt(mut self, pattern: Pattern) -> Self {
        self.username_prompt = Some(pattern);
        self
    }

    /// Set the login secret prompt.
    pub fn with_login_secret_prompt(mut self, pattern: Pattern) -> Self {
        self.login_secret_prompt = pattern;
        self
    }

    /// Set the unprivileged and privileged prompt markers.
    pub fn with_prompts(mut self, user: Pattern, privileged: Pattern) -> Self {
        self.user_prompt = user;
        self.privileged_prompt = privileged;
        self
    }

    /// Set the escalation command and its secret prompt.
    pub fn with_escalation(mut self, command: impl Into<String>, secret_prompt: Pattern) -> Self {
        self.escalate_command = command.into();
        self.escalate_secret_prompt = secret_prompt;
        self
    }

    /// Set the config submode enter/exit commands.
    pub fn with_config_mode(
        mut self,
        enter: impl Into<String>,
        exit: impl Into<String>,
    ) -> Self {
        self.config_enter_command = enter.into();
        self.config_exit_command = exit.into();
        self
    }

    /// Set the save command.
    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = Some(command.into());
        self
    }

    /// Set the logout command.
    pub fn with_logout_command(mut self, command: impl Into<String>) -> Self {
        self.logout_command = Some(command.into());
        self
    }

    /// Add a command run once the session is Ready.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add a failure substring.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Set the default expect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The config-submode prompt to expect.
    ///
    /// With a known hostname this is the exact literal the device will
    /// print (`R1(config)#`), so a device still showing the old hostname
    /// fails the expect instead of being silently accepted. Without a
    /// hostname the generic fallback pattern is used.
    pub fn config_prompt_for(&self, hostname: Option<&str>) -> Pattern {
        match hostname {
            Some(host) => Pattern::literal(format!("{}{}", host, self.config_prompt_suffix)),
            None => self.config_prompt_fallback.clone(),
        }
    }

    /// First failure substring found in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|p| output.contains(p.as_str()))
            .map(|p| p.as_str())
    }
}

/// Resolve a built-in profile by name.
pub fn lookup(name: &str) -> Option<DeviceProfile> {
    match name {
        "cisco_ios" => Some(cisco_ios::profile()),
        _ => None,
    }
}
