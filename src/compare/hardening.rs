//! Hardening-policy compliance as line-subset containment.

use std::collections::HashSet;

use serde::Serialize;

use super::ConfigDocument;

/// Result of checking a running configuration against a hardening policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceReport {
    /// Whether every non-blank policy line is present in the running config.
    pub compliant: bool,

    /// Policy lines absent from the running configuration, in policy order.
    pub missing: Vec<String>,
}

impl ComplianceReport {
    /// Human-readable summary.
    pub fn render(&self) -> String {
        if self.compliant {
            "Running configuration complies with the hardening policy.\n".to_string()
        } else {
            let mut out =
                String::from("Running configuration does not satisfy the hardening policy.\n");
            for line in &self.missing {
                out.push_str("  missing: ");
                out.push_str(line);
                out.push('\n');
            }
            out
        }
    }
}

/// Check that every non-blank, trimmed policy line occurs verbatim among
/// the running configuration's trimmed lines.
///
/// Deliberately weaker than an alignment diff: policy lines need not appear
/// in the same order or adjacency as in the running configuration, and
/// surrounding whitespace (including stray carriage returns) is ignored.
pub fn check_compliance(running: &ConfigDocument, policy: &ConfigDocument) -> ComplianceReport {
    let running_lines: HashSet<&str> = running.trimmed_lines().collect();

    let missing: Vec<String> = policy
        .trimmed_lines()
        .filter(|line| !running_lines.contains(line))
        .map(|line| line.to_string())
        .collect();

    ComplianceReport {
        compliant: missing.is_empty(),
        missing,
    }
}

/// Boolean form of [`check_compliance`].
pub fn is_compliant(running: &ConfigDocument, policy: &ConfigDocument) -> bool {
    check_compliance(running, policy).compliant
}
