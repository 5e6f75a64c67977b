//! Fleet orchestration: one isolated session drive per device target.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use indexmap::IndexMap;
use log::{debug, warn};
use tokio::sync::Semaphore;

use super::report::{FailureReport, FleetReport, RunRecord};
use super::reporter::{LogReporter, Reporter};
use crate::channel::ByteStream;
use crate::compare::{ComplianceReport, ConfigDocument, check_compliance};
use crate::error::{Error, ErrorKind, Result};
use crate::profile::DeviceProfile;
use crate::session::{CommandExecutor, Session};
use crate::transport::{
    AuthMethod, Credentials, HostKeyVerification, SshConfig, SshTransport,
};

/// One device to drive: where it is, how it talks, and what to run on it.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Host name or address.
    pub address: String,

    /// SSH port.
    pub port: u16,

    /// Prompt vocabulary and mode commands for this device.
    pub profile: DeviceProfile,

    /// Login and escalation identity.
    pub credentials: Credentials,

    /// Commands to run and capture, in order.
    pub commands: Vec<String>,

    /// Configuration commands to apply (empty for audit-only runs).
    pub config_commands: Vec<String>,
}

impl DeviceTarget {
    /// Target with no commands; add them with the builder methods.
    pub fn new(
        address: impl Into<String>,
        profile: DeviceProfile,
        credentials: Credentials,
    ) -> Self {
        Self {
            address: address.into(),
            port: 22,
            profile,
            credentials,
            commands: Vec::new(),
            config_commands: Vec::new(),
        }
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Append a command to run and capture.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Set the configuration commands to apply.
    pub fn with_config_commands(mut self, commands: Vec<String>) -> Self {
        self.config_commands = commands;
        self
    }
}

/// Opens an interactive stream to a target.
///
/// The production implementation is [`SshConnector`]; tests inject scripted
/// streams through this seam.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and hand back the raw interactive stream.
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn ByteStream>>;
}

/// Connector establishing real SSH sessions with password authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// known_hosts override.
    pub known_hosts_path: Option<std::path::PathBuf>,

    /// Transport-level connect timeout.
    pub connect_timeout: Duration,
}

impl Default for SshConnector {
    fn default() -> Self {
        Self {
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            connect_timeout: Duration::from_secs(20),
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, target: &DeviceTarget) -> Result<Box<dyn ByteStream>> {
        let mut config = SshConfig::new(
            target.address.clone(),
            target.credentials.username().to_string(),
            AuthMethod::Password(target.credentials.login_secret().clone()),
        );
        config.port = target.port;
        config.timeout = self.connect_timeout;
        config.host_key_verification = self.host_key_verification.clone();
        config.known_hosts_path = self.known_hosts_path.clone();

        let transport = SshTransport::connect(config).await?;
        Ok(Box::new(transport.open_shell().await?))
    }
}

/// Drives a list of device targets, each in its own task, and aggregates
/// the per-device outcomes.
///
/// A failure on one target is recorded against that target and never aborts
/// the rest: every target produces exactly one [`RunRecord`], in input
/// order. No session or channel crosses task boundaries.
pub struct FleetRunner {
    connector: Arc<dyn Connector>,
    reporter: Arc<dyn Reporter>,
    concurrency: usize,
    device_timeout: Duration,
    policy: Option<ConfigDocument>,
    running_config_command: String,
}

impl FleetRunner {
    /// Runner over the given connector, logging progress via [`LogReporter`].
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            reporter: Arc::new(LogReporter),
            concurrency: 4,
            device_timeout: Duration::from_secs(120),
            policy: None,
            running_config_command: "show running-config".to_string(),
        }
    }

    /// Replace the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Cap on simultaneously driven devices (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run-level time budget per device. A device exceeding it is recorded
    /// as timed out and its session torn down; other devices are unaffected.
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    /// Check every device's running configuration against this policy.
    pub fn with_hardening_policy(mut self, policy: ConfigDocument) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Command used to fetch the running configuration for policy checks.
    pub fn with_running_config_command(mut self, command: impl Into<String>) -> Self {
        self.running_config_command = command.into();
        self
    }

    /// Drive every target and aggregate the outcomes.
    pub async fn run(&self, targets: Vec<DeviceTarget>) -> FleetReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let addresses: Vec<String> = targets.iter().map(|t| t.address.clone()).collect();

        let mut handles = Vec::with_capacity(targets.len());
        for (index, target) in targets.into_iter().enumerate() {
            let connector = self.connector.clone();
            let reporter = self.reporter.clone();
            let policy = self.policy.clone();
            let running_config_command = self.running_config_command.clone();
            let device_timeout = self.device_timeout;
            let semaphore = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fleet semaphore closed");

                reporter.device_started(&target.address);
                let record = match tokio::time::timeout(
                    device_timeout,
                    drive_device(
                        &target,
                        connector.as_ref(),
                        policy.as_ref(),
                        &running_config_command,
                    ),
                )
                .await
                {
                    Ok(record) => record,
                    Err(_) => {
                        warn!("{}: run-level timeout, cancelling", target.address);
                        RunRecord::failure(
                            target.address.clone(),
                            IndexMap::new(),
                            FailureReport {
                                kind: ErrorKind::ProtocolTimeout,
                                step: "run".to_string(),
                                message: format!(
                                    "device run cancelled after {:?}",
                                    device_timeout
                                ),
                            },
                        )
                    }
                };
                reporter.device_finished(&record);
                (index, record)
            }));
        }

        let mut indexed: Vec<(usize, RunRecord)> = Vec::with_capacity(handles.len());
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => {
                    // A panicked worker must not take the fleet down with it.
                    warn!("worker for {} aborted: {}", addresses[index], e);
                    indexed.push((
                        index,
                        RunRecord::failure(
                            addresses[index].clone(),
                            IndexMap::new(),
                            FailureReport {
                                kind: ErrorKind::Connection,
                                step: "worker".to_string(),
                                message: e.to_string(),
                            },
                        ),
                    ));
                }
            }
        }
        indexed.sort_by_key(|(index, _)| *index);

        FleetReport {
            records: indexed.into_iter().map(|(_, record)| record).collect(),
        }
    }
}

type StepResult<T> = std::result::Result<T, (String, Error)>;

/// Drive one device start to finish, converting any step failure into a
/// failure record that keeps the outputs captured so far.
async fn drive_device(
    target: &DeviceTarget,
    connector: &dyn Connector,
    policy: Option<&ConfigDocument>,
    running_config_command: &str,
) -> RunRecord {
    let mut outputs = IndexMap::new();
    match drive_steps(
        target,
        connector,
        policy,
        running_config_command,
        &mut outputs,
    )
    .await
    {
        Ok(compliance) => RunRecord::success(target.address.clone(), outputs, compliance),
        Err((step, error)) => {
            debug!("{}: {} failed: {}", target.address, step, error);
            RunRecord::failure(
                target.address.clone(),
                outputs,
                FailureReport::new(step, &error),
            )
        }
    }
}

async fn drive_steps(
    target: &DeviceTarget,
    connector: &dyn Connector,
    policy: Option<&ConfigDocument>,
    running_config_command: &str,
    outputs: &mut IndexMap<String, String>,
) -> StepResult<Option<ComplianceReport>> {
    let stream = connector
        .connect(target)
        .await
        .map_err(|e| ("connect".to_string(), e))?;

    let mut session = Session::new(
        &target.address,
        target.profile.clone(),
        target.credentials.clone(),
    );

    let result = run_protocol(
        &mut session,
        stream,
        target,
        policy,
        running_config_command,
        outputs,
    )
    .await;

    // Whatever happened above, no live channel survives this function.
    if session.state().is_live() {
        let _ = session.close().await;
    }

    result
}

async fn run_protocol(
    session: &mut Session,
    stream: Box<dyn ByteStream>,
    target: &DeviceTarget,
    policy: Option<&ConfigDocument>,
    running_config_command: &str,
    outputs: &mut IndexMap<String, String>,
) -> StepResult<Option<ComplianceReport>> {
    session
        .open(stream)
        .await
        .map_err(|e| ("login".to_string(), e))?;

    if !session.is_privileged() && target.credentials.enable_secret().is_some() {
        session
            .enable()
            .await
            .map_err(|e| ("privilege escalation".to_string(), e))?;
    }

    let executor = CommandExecutor::new();

    for command in session.profile().on_open_commands.clone() {
        executor
            .run(session, &command)
            .await
            .map_err(|e| ("session setup".to_string(), e))?;
    }

    for command in &target.commands {
        let output = executor
            .run(session, command)
            .await
            .map_err(|e| (format!("command {}", command), e))?;
        outputs.insert(command.clone(), output.text);
    }

    let mut compliance = None;
    if let Some(policy) = policy {
        let output = executor
            .run(session, running_config_command)
            .await
            .map_err(|e| ("fetch running configuration".to_string(), e))?;
        let running = ConfigDocument::from_text(&output.text);
        compliance = Some(check_compliance(&running, policy));
    }

    if !target.config_commands.is_empty() {
        executor
            .apply_config(session, &target.config_commands)
            .await
            .map_err(|e| ("apply configuration".to_string(), e))?;

        // Persist only after every configuration step succeeded.
        if session.profile().save_command.is_some() {
            executor
                .save_config(session)
                .await
                .map_err(|e| ("persist configuration".to_string(), e))?;
        }
    }

    session
        .close()
        .await
        .map_err(|e| ("close".to_string(), e))?;

    Ok(compliance)
}
