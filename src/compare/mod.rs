//! Configuration comparison: line diffs and hardening compliance.
//!
//! Pure functions over [`ConfigDocument`]s. Nothing here touches a session;
//! callers capture text first and persist or print the results themselves.

mod diff;
mod hardening;

pub use diff::{DiffResult, Edit, EditKind, diff_lines};
pub use hardening::{ComplianceReport, check_compliance, is_compliant};

use std::path::Path;

use crate::error::CompareError;

/// An ordered sequence of configuration lines.
///
/// A document has no identity beyond its lines: two documents are related
/// by [`diff_lines`] or by compliance containment, never by whole-text
/// equality (too brittle against whitespace and ordering noise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
}

impl ConfigDocument {
    /// Build a document from raw text, splitting on line endings.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }

    /// Load a document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CompareError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(&text))
    }

    /// The lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Trimmed, non-blank lines, in order.
    pub fn trimmed_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty())
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&str> for ConfigDocument {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
