//! Line-based sequence alignment between two configuration documents.

use serde::Serialize;

use super::ConfigDocument;

/// How one line participates in the alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Present only in the right document.
    Added,

    /// Present only in the left document.
    Removed,

    /// Present in both.
    Unchanged,
}

/// One line of the edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub kind: EditKind,
    pub line: String,
}

/// A minimal edit script between two documents.
///
/// Line order of both inputs is preserved: replaying `Removed` + `Unchanged`
/// reproduces the left document, `Added` + `Unchanged` the right one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub edits: Vec<Edit>,
}

impl DiffResult {
    /// Whether the documents are line-identical.
    pub fn is_identical(&self) -> bool {
        self.edits.iter().all(|e| e.kind == EditKind::Unchanged)
    }

    /// Reconstruct the left document's lines from the edit script.
    pub fn left_lines(&self) -> Vec<&str> {
        self.edits
            .iter()
            .filter(|e| e.kind != EditKind::Added)
            .map(|e| e.line.as_str())
            .collect()
    }

    /// Reconstruct the right document's lines from the edit script.
    pub fn right_lines(&self) -> Vec<&str> {
        self.edits
            .iter()
            .filter(|e| e.kind != EditKind::Removed)
            .map(|e| e.line.as_str())
            .collect()
    }

    /// Count of added and removed lines.
    pub fn change_count(&self) -> usize {
        self.edits
            .iter()
            .filter(|e| e.kind != EditKind::Unchanged)
            .count()
    }

    /// Render the script differ-style: `  `, `- `, `+ ` prefixes.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for edit in &self.edits {
            let prefix = match edit.kind {
                EditKind::Added => "+ ",
                EditKind::Removed => "- ",
                EditKind::Unchanged => "  ",
            };
            out.push_str(prefix);
            out.push_str(&edit.line);
            out.push('\n');
        }
        out
    }
}

/// Align two documents line-by-line, producing a minimal edit script.
///
/// Classic longest-common-subsequence alignment. Matching prefix and suffix
/// runs are peeled off first, so the quadratic table only covers the changed
/// middle, so configurations that differ in a handful of lines stay cheap.
pub fn diff_lines(a: &ConfigDocument, b: &ConfigDocument) -> DiffResult {
    let a_lines = a.lines();
    let b_lines = b.lines();

    // Common prefix.
    let mut prefix = 0;
    while prefix < a_lines.len() && prefix < b_lines.len() && a_lines[prefix] == b_lines[prefix] {
        prefix += 1;
    }

    // Common suffix (not overlapping the prefix).
    let mut suffix = 0;
    while suffix < a_lines.len() - prefix
        && suffix < b_lines.len() - prefix
        && a_lines[a_lines.len() - 1 - suffix] == b_lines[b_lines.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let a_mid = &a_lines[prefix..a_lines.len() - suffix];
    let b_mid = &b_lines[prefix..b_lines.len() - suffix];

    let mut edits = Vec::with_capacity(a_lines.len().max(b_lines.len()));
    for line in &a_lines[..prefix] {
        edits.push(Edit {
            kind: EditKind::Unchanged,
            line: line.clone(),
        });
    }
    edits.extend(align(a_mid, b_mid));
    for line in &a_lines[a_lines.len() - suffix..] {
        edits.push(Edit {
            kind: EditKind::Unchanged,
            line: line.clone(),
        });
    }

    DiffResult { edits }
}

/// LCS alignment of the changed middle region.
fn align(a: &[String], b: &[String]) -> Vec<Edit> {
    let n = a.len();
    let m = b.len();

    // lcs[i][j] = LCS length of a[i..] and b[j..].
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut edits = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            edits.push(Edit {
                kind: EditKind::Unchanged,
                line: a[i].clone(),
            });
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            edits.push(Edit {
                kind: EditKind::Removed,
                line: a[i].clone(),
            });
            i += 1;
        } else {
            edits.push(Edit {
                kind: EditKind::Added,
                line: b[j].clone(),
            });
            j += 1;
        }
    }
    for line in &a[i..] {
        edits.push(Edit {
            kind: EditKind::Removed,
            line: line.clone(),
        });
    }
    for line in &b[j..] {
        edits.push(Edit {
            kind: EditKind::Added,
            line: line.clone(),
        });
    }

    edits
}
