//! Command execution against a Ready session.

use std::time::Duration;

use log::debug;

use super::machine::Session;
use super::response::CapturedOutput;
use crate::channel::{ExpectSpec, Pattern};
use crate::error::{Result, SessionError};

/// Executes commands on a session, bounding each capture by a prompt.
///
/// The expected prompt is taken from the session's current state by default
/// and can be overridden per call, which is how command sequences that move
/// between prompt contexts are driven.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    /// Per-command timeout override; the profile's timeout otherwise.
    timeout: Option<Duration>,
}

impl CommandExecutor {
    /// Executor using each profile's default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor with a fixed per-command timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Send `command` and capture output until the state's prompt returns.
    pub async fn run(&self, session: &mut Session, command: &str) -> Result<CapturedOutput> {
        let prompt = session
            .command_prompt()
            .ok_or(SessionError::NotReady {
                state: session.state(),
            })?;
        self.run_expecting(session, command, prompt).await
    }

    /// Send `command` and capture output until `prompt` matches.
    ///
    /// Callers supply the pattern when the command changes the prompt
    /// context (entering a submode, renaming the device).
    pub async fn run_expecting(
        &self,
        session: &mut Session,
        command: &str,
        prompt: Pattern,
    ) -> Result<CapturedOutput> {
        if !session.state().accepts_commands() {
            return Err(SessionError::NotReady {
                state: session.state(),
            }
            .into());
        }

        let timeout = self.timeout.unwrap_or(session.profile().timeout);
        session.send_step(command).await?;

        let spec = ExpectSpec::single("prompt", prompt, timeout);
        let matched = session.expect_for_command(&spec, command).await?;

        let text = normalize_output(&matched.before, command);
        let failure_message = session
            .profile()
            .detect_failure(&text)
            .map(|p| p.to_string());

        debug!(
            "{}: {:?} captured {} bytes in {:?}",
            session.target(),
            command,
            text.len(),
            matched.elapsed
        );

        Ok(CapturedOutput {
            command: command.to_string(),
            text,
            raw: matched.before,
            prompt: matched.matched,
            elapsed: matched.elapsed,
            failure_message,
        })
    }

    /// Run commands in order, stopping at the first error.
    pub async fn run_sequence(
        &self,
        session: &mut Session,
        commands: &[String],
    ) -> Result<Vec<CapturedOutput>> {
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            outputs.push(self.run(session, command).await?);
        }
        Ok(outputs)
    }

    /// Apply configuration commands with per-step failure detection.
    ///
    /// Enters the configuration submode, sends each command, and treats any
    /// failure substring in a step's output as a rejection: remaining steps
    /// are skipped, the submode is left, and the rejection is returned. The
    /// session itself stays healthy: the device refused a line, the
    /// channel did not break.
    pub async fn apply_config(
        &self,
        session: &mut Session,
        commands: &[String],
    ) -> Result<Vec<CapturedOutput>> {
        session.enter_config(None).await?;

        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            let output = self.run(session, command).await?;
            if let Some(message) = output.failure_message.clone() {
                session.exit_config().await?;
                return Err(SessionError::CommandRejected {
                    command: command.clone(),
                    message,
                }
                .into());
            }
            outputs.push(output);
        }

        session.exit_config().await?;
        Ok(outputs)
    }

    /// Persist the running configuration.
    ///
    /// Only valid at the privileged prompt; callers invoke this after every
    /// configuration step succeeded, never unconditionally.
    pub async fn save_config(&self, session: &mut Session) -> Result<CapturedOutput> {
        if !session.is_privileged() || session.state() == crate::session::SessionState::ConfigSubmode
        {
            return Err(SessionError::NotReady {
                state: session.state(),
            }
            .into());
        }

        let Some(command) = session.profile().save_command.clone() else {
            return Err(SessionError::CommandRejected {
                command: String::new(),
                message: "profile defines no save command".to_string(),
            }
            .into());
        };

        let output = self.run(session, &command).await?;
        if let Some(message) = output.failure_message.clone() {
            return Err(SessionError::CommandRejected { command, message }.into());
        }
        Ok(output)
    }
}

/// Strip the echoed command and the trailing prompt-line remnant.
///
/// The capture may begin with residue from the previous prompt (trailing
/// spaces the device printed after it), so the echo is located rather than
/// assumed to sit at offset zero.
fn normalize_output(raw: &str, command: &str) -> String {
    let output = match raw.find(command) {
        Some(pos) => &raw[pos + command.len()..],
        None => raw,
    };
    let output = output.trim_start_matches(['\r', '\n']);

    match output.rfind('\n') {
        Some(pos) => output[..pos].trim_end_matches('\r').to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorKind;
    use crate::profile;
    use crate::session::SessionState;
    use crate::test_support::{ScriptStep, ScriptedStream};
    use crate::transport::Credentials;

    fn ready_session(script: Vec<ScriptStep>) -> (Session, ScriptedStream) {
        let mut full = vec![ScriptStep::Recv("R1# ".into())];
        full.extend(script);
        let stream = ScriptedStream::new(full);
        let profile = profile::cisco_ios::profile().with_timeout(Duration::from_millis(50));
        let session = Session::new(
            "10.0.0.2",
            profile,
            Credentials::new("prne", "cisco123!").with_enable_secret("class123!"),
        );
        (session, stream)
    }

    #[tokio::test]
    async fn test_run_captures_before_text() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Recv(
            "show version\r\nCisco IOS Software, Version 15.2(4)M7\r\nR1# ".into(),
        )]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let output = executor.run(&mut session, "show version").await.unwrap();

        assert_eq!(output.text, "Cisco IOS Software, Version 15.2(4)M7");
        assert_eq!(output.prompt, "#");
        assert!(output.is_success());
    }

    #[tokio::test]
    async fn test_run_requires_ready_session() {
        let profile = profile::cisco_ios::profile();
        let mut session = Session::new(
            "10.0.0.2",
            profile,
            Credentials::new("prne", "cisco123!"),
        );

        let executor = CommandExecutor::new();
        let err = executor
            .run(&mut session, "show version")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotReady);
    }

    #[tokio::test]
    async fn test_command_timeout_fails_session() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Hang]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let err = executor
            .run(&mut session, "show running-config")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CommandTimeout);
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_failure_substring_marks_output() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Recv(
            "show verison\r\n% Invalid input detected at '^' marker.\r\nR1# ".into(),
        )]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let output = executor.run(&mut session, "show verison").await.unwrap();

        assert!(!output.is_success());
        assert_eq!(output.failure_message.as_deref(), Some("% Invalid input"));
    }

    #[tokio::test]
    async fn test_per_call_prompt_override() {
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv("hostname R9\r\nR9(config)# ".into()),
        ]);
        session.open(Box::new(stream)).await.unwrap();
        session.enter_config(Some("R1")).await.unwrap();

        let executor = CommandExecutor::new();
        let output = executor
            .run_expecting(
                &mut session,
                "hostname R9",
                Pattern::literal("R9(config)#"),
            )
            .await
            .unwrap();
        assert_eq!(output.prompt, "R9(config)#");
    }

    #[tokio::test]
    async fn test_apply_config_happy_path() {
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv("logging host 192.168.1.2\r\nR1(config)# ".into()),
            ScriptStep::Recv("logging on\r\nR1(config)# ".into()),
            ScriptStep::Recv("end\r\nR1# ".into()),
        ]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let outputs = executor
            .apply_config(
                &mut session,
                &[
                    "logging host 192.168.1.2".to_string(),
                    "logging on".to_string(),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(session.state(), SessionState::Ready { privileged: true });
    }

    #[tokio::test]
    async fn test_apply_config_stops_on_rejected_step() {
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv(
                "ip acess-list standard MY_ACL\r\n% Invalid input detected at '^' marker.\r\nR1(config)# "
                    .into(),
            ),
            ScriptStep::Recv("end\r\nR1# ".into()),
        ]);
        let sent = stream.sent();
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let err = executor
            .apply_config(
                &mut session,
                &[
                    "ip acess-list standard MY_ACL".to_string(),
                    "permit 192.168.56.0 0.0.0.255".to_string(),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CommandRejected);
        // The second step was never sent; the submode was left cleanly.
        let sent = sent.lock().unwrap();
        assert!(!sent.iter().any(|l| l.starts_with("permit")));
        assert_eq!(sent.last().unwrap(), "end\n");
        assert_eq!(session.state(), SessionState::Ready { privileged: true });
    }

    #[tokio::test]
    async fn test_save_config_runs_write_memory() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Recv(
            "write memory\r\nBuilding configuration...\r\n[OK]\r\nR1# ".into(),
        )]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let output = executor.save_config(&mut session).await.unwrap();
        assert_eq!(output.command, "write memory");
        assert!(output.contains("[OK]"));
    }

    #[tokio::test]
    async fn test_save_config_refused_outside_privileged_prompt() {
        let stream = ScriptedStream::new(vec![ScriptStep::Recv("Router> ".into())]);
        let profile = profile::cisco_ios::profile().with_timeout(Duration::from_millis(50));
        let mut session = Session::new(
            "10.0.0.2",
            profile,
            Credentials::new("prne", "cisco123!"),
        );
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let err = executor.save_config(&mut session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotReady);
    }

    #[test]
    fn test_normalize_output() {
        let raw = "show version\r\nCisco IOS\r\nline two\r\nR1";
        assert_eq!(normalize_output(raw, "show version"), "Cisco IOS\r\nline two");

        // Prompt residue before the echo is dropped along with it.
        let raw = " show version\r\nCisco IOS\r\nR1";
        assert_eq!(normalize_output(raw, "show version"), "Cisco IOS");

        // No newline at all: nothing but the prompt remnant.
        assert_eq!(normalize_output("R1", "show clock"), "");
    }
}
