//! Canned device workflows built on the session and executor primitives.
//!
//! These are the recurring audit/configure chores: pull a configuration,
//! rename the device, point syslog somewhere, read off the software
//! version. Command text here is Cisco IOS vocabulary; everything flows
//! through the same profile-driven machinery as caller-supplied commands.

use crate::compare::ConfigDocument;
use crate::error::Result;
use crate::session::{CapturedOutput, CommandExecutor, Session, SessionState};

/// Fetch the running configuration as a document.
pub async fn fetch_running_config(
    executor: &CommandExecutor,
    session: &mut Session,
) -> Result<ConfigDocument> {
    let output = executor.run(session, "show running-config").await?;
    Ok(ConfigDocument::from_text(&output.text))
}

/// Fetch the startup configuration as a document.
pub async fn fetch_startup_config(
    executor: &CommandExecutor,
    session: &mut Session,
) -> Result<ConfigDocument> {
    let output = executor.run(session, "show startup-config").await?;
    Ok(ConfigDocument::from_text(&output.text))
}

/// Rename the device, verifying the prompt actually changed.
///
/// The expect after `hostname <name>` is the *new* hostname's config
/// prompt: a device that has not applied the change keeps printing the old
/// prompt and the step times out instead of passing silently. On success
/// the session's config-submode prompt is updated to the new hostname.
pub async fn configure_hostname(
    executor: &CommandExecutor,
    session: &mut Session,
    hostname: &str,
) -> Result<()> {
    let entered_here = session.state() != SessionState::ConfigSubmode;
    if entered_here {
        session.enter_config(None).await?;
    }

    let prompt = session.profile().config_prompt_for(Some(hostname));
    executor
        .run_expecting(session, &format!("hostname {}", hostname), prompt.clone())
        .await?;
    session.set_config_prompt(prompt);

    if entered_here {
        session.exit_config().await?;
    }
    Ok(())
}

/// Point the device's syslog at `server` and enable logging.
pub async fn enable_syslog(
    executor: &CommandExecutor,
    session: &mut Session,
    server: &str,
) -> Result<Vec<CapturedOutput>> {
    executor
        .apply_config(
            session,
            &[
                format!("logging host {}", server),
                "logging trap informational".to_string(),
                "logging on".to_string(),
            ],
        )
        .await
}

/// Read the device's software version string.
pub async fn scrape_version(
    executor: &CommandExecutor,
    session: &mut Session,
) -> Result<Option<String>> {
    let output = executor
        .run(session, "show version | include Version")
        .await?;
    Ok(parse_version(&output.text))
}

/// Extract the `Version ...` field from a `show version` line.
///
/// IOS prints a comma-separated header line such as
/// `Cisco IOS Software, C2900 Software, Version 15.2(4)M7, RELEASE ...`;
/// the field starting with `Version` is the one callers want.
pub fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("Version"))
        .and_then(|line| {
            line.split(',')
                .map(str::trim)
                .find(|field| field.starts_with("Version"))
                .map(|field| field.to_string())
        })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::profile;
    use crate::test_support::{ScriptStep, ScriptedStream};
    use crate::transport::Credentials;

    fn ready_session(script: Vec<ScriptStep>) -> (Session, ScriptedStream) {
        let mut full = vec![ScriptStep::Recv("R1# ".into())];
        full.extend(script);
        let stream = ScriptedStream::new(full);
        let profile = profile::cisco_ios::profile().with_timeout(Duration::from_millis(50));
        let session = Session::new("10.0.0.1", profile, Credentials::new("prne", "cisco123!"));
        (session, stream)
    }

    #[test]
    fn test_parse_version_from_header_line() {
        let output = "Cisco IOS Software, C2900 Software (C2900-UNIVERSALK9-M), \
                      Version 15.2(4)M7, RELEASE SOFTWARE (fc2)";
        assert_eq!(parse_version(output).as_deref(), Some("Version 15.2(4)M7"));
    }

    #[test]
    fn test_parse_version_absent() {
        assert_eq!(parse_version("nothing useful here"), None);
    }

    #[tokio::test]
    async fn test_fetch_running_config() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Recv(
            "show running-config\r\nhostname R1\r\nip ssh version 2\r\nR1# ".into(),
        )]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let doc = fetch_running_config(&executor, &mut session).await.unwrap();
        assert_eq!(doc.lines(), ["hostname R1", "ip ssh version 2"]);
    }

    #[tokio::test]
    async fn test_configure_hostname_verifies_new_prompt() {
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv("hostname R9\r\nR9(config)# ".into()),
            ScriptStep::Recv("end\r\nR9# ".into()),
        ]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        configure_hostname(&executor, &mut session, "R9")
            .await
            .unwrap();
        assert_eq!(
            session.state(),
            SessionState::Ready { privileged: true }
        );
    }

    #[tokio::test]
    async fn test_configure_hostname_rejects_stale_prompt() {
        // Device keeps the old hostname in the prompt: must time out.
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv("hostname R9\r\nR1(config)# ".into()),
        ]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let err = configure_hostname(&executor, &mut session, "R9")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::CommandTimeout);
    }

    #[tokio::test]
    async fn test_enable_syslog_sends_sequence() {
        let (mut session, stream) = ready_session(vec![
            ScriptStep::Recv("configure terminal\r\nR1(config)# ".into()),
            ScriptStep::Recv("logging host 192.168.1.2\r\nR1(config)# ".into()),
            ScriptStep::Recv("logging trap informational\r\nR1(config)# ".into()),
            ScriptStep::Recv("logging on\r\nR1(config)# ".into()),
            ScriptStep::Recv("end\r\nR1# ".into()),
        ]);
        let sent = stream.sent();
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let outputs = enable_syslog(&executor, &mut session, "192.168.1.2")
            .await
            .unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(
            sent.lock()
                .unwrap()
                .contains(&"logging host 192.168.1.2\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_scrape_version() {
        let (mut session, stream) = ready_session(vec![ScriptStep::Recv(
            "show version | include Version\r\n\
             Cisco IOS XE Software, Version 16.09.04\r\nR1# "
                .into(),
        )]);
        session.open(Box::new(stream)).await.unwrap();

        let executor = CommandExecutor::new();
        let version = scrape_version(&executor, &mut session).await.unwrap();
        assert_eq!(version.as_deref(), Some("Version 16.09.04"));
    }
}
