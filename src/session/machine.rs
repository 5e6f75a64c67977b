//! The login/command/teardown protocol driven as an explicit state machine.

use log::{debug, info, warn};

use super::state::SessionState;
use crate::channel::{ByteStream, Channel, ExpectMatch, ExpectSpec, Pattern};
use crate::error::{ChannelError, Error, Result, SessionError};
use crate::profile::DeviceProfile;
use crate::transport::Credentials;

/// One live interactive session with one device.
///
/// The session owns its channel exclusively and advances its state only
/// after a successful pattern match; any expect step that times out or hits
/// end-of-stream moves the session to `Failed` and releases the channel
/// exactly once. `Failed` and `Closed` are absorbing.
pub struct Session {
    target: String,
    profile: DeviceProfile,
    credentials: Credentials,
    state: SessionState,
    channel: Option<Channel>,

    /// Prompt expected while inside the configuration submode.
    config_prompt: Option<Pattern>,
}

impl Session {
    /// Create a disconnected session for one device.
    pub fn new(
        target: impl Into<String>,
        profile: DeviceProfile,
        credentials: Credentials,
    ) -> Self {
        Self {
            target: target.into(),
            profile,
            credentials,
            state: SessionState::Disconnected,
            channel: None,
            config_prompt: None,
        }
    }

    /// The device this session talks to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The device profile in use.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Whether the session holds the privileged prompt.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self.state,
            SessionState::Ready { privileged: true } | SessionState::ConfigSubmode
        )
    }

    /// Attach a stream and drive the login sequence to a shell prompt.
    ///
    /// The first expect accepts, in priority order: the host-key
    /// confirmation question (answered affirmatively and re-expected), an
    /// in-stream username prompt, the login secret prompt, or (for
    /// transports that authenticate out-of-band) the privileged or
    /// unprivileged shell prompt directly.
    pub async fn open(&mut self, stream: Box<dyn ByteStream>) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(SessionError::AlreadyOpen.into());
        }

        self.channel = Some(Channel::new(stream));
        self.state = SessionState::Connecting;
        debug!("{}: connecting", self.target);

        let mut host_key_rounds = 0u8;
        loop {
            let spec = self.connecting_spec();
            let matched = self.expect_step(&spec, "login prompt", None).await?;

            match matched.name.as_str() {
                "host-key-confirm" => {
                    // Seen at most once per legitimate handshake; a device
                    // looping on it will never log in.
                    host_key_rounds += 1;
                    if host_key_rounds > 2 {
                        let state = self.state;
                        self.fail().await;
                        return Err(SessionError::ProtocolTimeout {
                            state,
                            waiting_for: "login secret prompt".to_string(),
                        }
                        .into());
                    }
                    debug!("{}: confirming new host key", self.target);
                    let reply = self.profile.host_key_reply.clone();
                    self.send_step(&reply).await?;
                }
                "username" => {
                    let username = self.credentials.username().to_string();
                    self.send_step(&username).await?;
                }
                "login-secret" => {
                    self.state = SessionState::AwaitingLoginSecret;
                    let secret = self.credentials.login_secret().clone();
                    self.send_secret_step(&secret).await?;

                    let spec = self.shell_prompt_spec();
                    let matched = self
                        .expect_step(&spec, "shell prompt", Some("login"))
                        .await?;
                    self.state = SessionState::Ready {
                        privileged: matched.name == "privileged",
                    };
                    break;
                }
                "privileged" => {
                    self.state = SessionState::Ready { privileged: true };
                    break;
                }
                "user" => {
                    self.state = SessionState::Ready { privileged: false };
                    break;
                }
                other => unreachable!("unknown login candidate {:?}", other),
            }
        }

        info!("{}: session {}", self.target, self.state);
        Ok(())
    }

    /// Escalate to the privileged prompt. No-op when already privileged.
    pub async fn enable(&mut self) -> Result<()> {
        match self.state {
            SessionState::Ready { privileged: true } => return Ok(()),
            SessionState::Ready { privileged: false } => {}
            state => return Err(SessionError::NotReady { state }.into()),
        }

        let Some(secret) = self.credentials.enable_secret().cloned() else {
            return Err(SessionError::MissingEnableSecret.into());
        };

        let command = self.profile.escalate_command.clone();
        self.send_step(&command).await?;

        let spec = ExpectSpec::single(
            "escalation-secret",
            self.profile.escalate_secret_prompt.clone(),
            self.profile.timeout,
        );
        self.expect_step(&spec, "escalation secret prompt", None)
            .await?;
        self.state = SessionState::AwaitingPrivilegeSecret;

        self.send_secret_step(&secret).await?;

        let spec = ExpectSpec::single(
            "privileged",
            self.profile.privileged_prompt.clone(),
            self.profile.timeout,
        );
        self.expect_step(&spec, "privileged prompt", Some("privilege escalation"))
            .await?;
        self.state = SessionState::Ready { privileged: true };

        debug!("{}: privileged", self.target);
        Ok(())
    }

    /// Enter the configuration submode.
    ///
    /// With a known hostname the expected prompt is the exact text the
    /// device will print; a device still showing a different hostname fails
    /// this step with a timeout instead of being silently accepted.
    pub async fn enter_config(&mut self, hostname: Option<&str>) -> Result<()> {
        if !matches!(self.state, SessionState::Ready { privileged: true }) {
            return Err(SessionError::NotReady { state: self.state }.into());
        }

        let command = self.profile.config_enter_command.clone();
        self.send_step(&command).await?;

        let prompt = self.profile.config_prompt_for(hostname);
        let spec = ExpectSpec::single("config-prompt", prompt.clone(), self.profile.timeout);
        self.expect_step(&spec, "configuration prompt", None).await?;

        self.config_prompt = Some(prompt);
        self.state = SessionState::ConfigSubmode;
        debug!("{}: entered configuration submode", self.target);
        Ok(())
    }

    /// Leave the configuration submode, back to the privileged prompt.
    pub async fn exit_config(&mut self) -> Result<()> {
        if self.state != SessionState::ConfigSubmode {
            return Err(SessionError::NotReady { state: self.state }.into());
        }

        let command = self.profile.config_exit_command.clone();
        self.send_step(&command).await?;

        let spec = ExpectSpec::single(
            "privileged",
            self.profile.privileged_prompt.clone(),
            self.profile.timeout,
        );
        self.expect_step(&spec, "privileged prompt", None).await?;

        self.config_prompt = None;
        self.state = SessionState::Ready { privileged: true };
        debug!("{}: left configuration submode", self.target);
        Ok(())
    }

    /// Replace the expected configuration-submode prompt (used after a
    /// command that changes it, such as a hostname change).
    pub fn set_config_prompt(&mut self, prompt: Pattern) {
        self.config_prompt = Some(prompt);
    }

    /// The prompt that terminates a command in the current state.
    pub(crate) fn command_prompt(&self) -> Option<Pattern> {
        match self.state {
            SessionState::Ready { privileged: true } => {
                Some(self.profile.privileged_prompt.clone())
            }
            SessionState::Ready { privileged: false } => Some(self.profile.user_prompt.clone()),
            SessionState::ConfigSubmode => Some(
                self.config_prompt
                    .clone()
                    .unwrap_or_else(|| self.profile.config_prompt_fallback.clone()),
            ),
            _ => None,
        }
    }

    /// Close the session deliberately. Idempotent; a `Failed` session stays
    /// `Failed` but its (already released) channel is not touched again.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if self.state.accepts_commands() {
                if let Some(logout) = self.profile.logout_command.clone() {
                    // Best effort: the device may drop the link first.
                    let _ = channel.send_line(&logout).await;
                }
            }
            if let Err(e) = channel.close().await {
                warn!("{}: channel close failed: {}", self.target, e);
            }
        }
        if self.state != SessionState::Failed {
            self.state = SessionState::Closed;
        }
        debug!("{}: session {}", self.target, self.state);
        Ok(())
    }

    /// Release the channel and mark the session failed. Safe to call more
    /// than once; the channel is shut down exactly once.
    pub(crate) async fn fail(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                warn!("{}: channel close failed: {}", self.target, e);
            }
        }
        self.state = SessionState::Failed;
    }

    /// Candidates accepted while connecting, in priority order.
    fn connecting_spec(&self) -> ExpectSpec {
        let mut spec = ExpectSpec::new(self.profile.timeout);
        if let Some(pattern) = &self.profile.host_key_prompt {
            spec = spec.candidate("host-key-confirm", pattern.clone());
        }
        if let Some(pattern) = &self.profile.username_prompt {
            spec = spec.candidate("username", pattern.clone());
        }
        spec = spec.candidate("login-secret", self.profile.login_secret_prompt.clone());
        spec = spec.candidate("privileged", self.profile.privileged_prompt.clone());
        spec.candidate("user", self.profile.user_prompt.clone())
    }

    /// Candidates accepted right after the login secret was sent.
    fn shell_prompt_spec(&self) -> ExpectSpec {
        ExpectSpec::new(self.profile.timeout)
            .candidate("privileged", self.profile.privileged_prompt.clone())
            .candidate("user", self.profile.user_prompt.clone())
    }

    /// Run one expect step; on timeout/EOF the session fails and the error
    /// is classified (`auth_step` marks steps where a timeout means a
    /// rejected secret rather than a protocol stall).
    async fn expect_step(
        &mut self,
        spec: &ExpectSpec,
        waiting_for: &str,
        auth_step: Option<&str>,
    ) -> Result<ExpectMatch> {
        let result = match self.channel.as_mut() {
            Some(channel) => channel.expect(spec).await,
            None => Err(ChannelError::Closed),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(e) => Err(self.fail_classified(e, waiting_for, auth_step).await),
        }
    }

    /// Send a line; on channel failure the session fails.
    pub(crate) async fn send_step(&mut self, line: &str) -> Result<()> {
        let result = match self.channel.as_mut() {
            Some(channel) => channel.send_line(line).await,
            None => Err(ChannelError::Closed),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail_classified(e, "send", None).await),
        }
    }

    /// Send a secret line; the value is never logged.
    async fn send_secret_step(&mut self, secret: &secrecy::SecretString) -> Result<()> {
        let result = match self.channel.as_mut() {
            Some(channel) => channel.send_secret_line(secret).await,
            None => Err(ChannelError::Closed),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail_classified(e, "send", None).await),
        }
    }

    /// Run one expect step for a command; a timeout is a `CommandTimeout`.
    pub(crate) async fn expect_for_command(
        &mut self,
        spec: &ExpectSpec,
        command: &str,
    ) -> Result<ExpectMatch> {
        let result = match self.channel.as_mut() {
            Some(channel) => channel.expect(spec).await,
            None => Err(ChannelError::Closed),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(ChannelError::PatternTimeout(_)) => {
                self.fail().await;
                Err(SessionError::CommandTimeout {
                    command: command.to_string(),
                }
                .into())
            }
            Err(e) => Err(self.fail_classified(e, "command prompt", None).await),
        }
    }

    async fn fail_classified(
        &mut self,
        err: ChannelError,
        waiting_for: &str,
        auth_step: Option<&str>,
    ) -> Error {
        let state = self.state;
        self.fail().await;

        match err {
            ChannelError::PatternTimeout(_) => match auth_step {
                Some(step) => SessionError::AuthenticationRejected {
                    step: step.to_string(),
                }
                .into(),
                None => SessionError::ProtocolTimeout {
                    state,
                    waiting_for: waiting_for.to_string(),
                }
                .into(),
            },
            ChannelError::Closed => SessionError::UnexpectedEof { state }.into(),
            other => other.into(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!(
                "{}: session dropped without close(); transport released by drop",
                self.target
            );
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .field("state", &self.state)
            .field("profile", &self.profile.name)
            .finish()
    }
}
