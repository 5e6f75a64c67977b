//! Per-device and whole-fleet run results.

use indexmap::IndexMap;
use serde::Serialize;

use crate::compare::ComplianceReport;
use crate::error::{Error, ErrorKind};

/// Context of a per-device failure: what failed, where, and why.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    /// Coarse classification of the failure.
    pub kind: ErrorKind,

    /// The step that failed ("login", "command show version", ...).
    pub step: String,

    /// Rendered error message.
    pub message: String,
}

impl FailureReport {
    /// Build from a failing step and its error.
    pub fn new(step: impl Into<String>, error: &Error) -> Self {
        Self {
            kind: error.kind(),
            step: step.into(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one device's drive.
#[derive(Debug, Serialize)]
pub struct RunRecord {
    /// The device this record describes.
    pub target: String,

    /// Whether every step completed.
    pub succeeded: bool,

    /// Captured output per command, in execution order. Outputs collected
    /// before a failure are kept.
    pub outputs: IndexMap<String, String>,

    /// Failure context when `succeeded` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,

    /// Hardening verdict, when a policy was checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceReport>,
}

impl RunRecord {
    /// Record a fully successful drive.
    pub fn success(
        target: impl Into<String>,
        outputs: IndexMap<String, String>,
        compliance: Option<ComplianceReport>,
    ) -> Self {
        Self {
            target: target.into(),
            succeeded: true,
            outputs,
            error: None,
            compliance,
        }
    }

    /// Record a failed drive, keeping whatever was captured first.
    pub fn failure(
        target: impl Into<String>,
        outputs: IndexMap<String, String>,
        failure: FailureReport,
    ) -> Self {
        Self {
            target: target.into(),
            succeeded: false,
            outputs,
            error: Some(failure),
            compliance: None,
        }
    }
}

/// Aggregated results for a whole fleet run, in input target order.
#[derive(Debug, Serialize)]
pub struct FleetReport {
    pub records: Vec<RunRecord>,
}

impl FleetReport {
    /// Whether no device failed. Callers map this onto their exit code.
    pub fn all_succeeded(&self) -> bool {
        self.records.iter().all(|r| r.succeeded)
    }

    /// The failed records.
    pub fn failures(&self) -> impl Iterator<Item = &RunRecord> {
        self.records.iter().filter(|r| !r.succeeded)
    }

    /// Human-readable one-line-per-device summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            match &record.error {
                None => {
                    out.push_str(&format!(
                        "{}: ok ({} commands)\n",
                        record.target,
                        record.outputs.len()
                    ));
                }
                Some(failure) => {
                    out.push_str(&format!(
                        "{}: FAILED at {} ({:?}): {}\n",
                        record.target, failure.step, failure.kind, failure.message
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::session::SessionState;

    fn failed_record(target: &str) -> RunRecord {
        let error = Error::from(SessionError::ProtocolTimeout {
            state: SessionState::Connecting,
            waiting_for: "login prompt".to_string(),
        });
        RunRecord::failure(target, IndexMap::new(), FailureReport::new("login", &error))
    }

    #[test]
    fn test_all_succeeded() {
        let report = FleetReport {
            records: vec![
                RunRecord::success("10.0.0.1", IndexMap::new(), None),
                failed_record("10.0.0.2"),
            ],
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_summary_contains_step_and_kind() {
        let report = FleetReport {
            records: vec![failed_record("10.0.0.2")],
        };
        let summary = report.summary();
        assert!(summary.contains("10.0.0.2"));
        assert!(summary.contains("login"));
        assert!(summary.contains("ProtocolTimeout"));
    }

    #[test]
    fn test_record_serializes_without_secrets() {
        let mut outputs = IndexMap::new();
        outputs.insert("show version".to_string(), "Cisco IOS".to_string());
        let record = RunRecord::success("10.0.0.1", outputs, None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["target"], "10.0.0.1");
        assert_eq!(json["succeeded"], true);
        assert_eq!(json["outputs"]["show version"], "Cisco IOS");
        assert!(json.get("error").is_none());
    }
}
