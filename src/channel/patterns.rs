//! Candidate patterns and expect specifications for prompt detection.

use std::time::Duration;

use regex::bytes::Regex;

/// A single candidate pattern: a literal substring or a regular expression.
///
/// Literals are matched with `memchr::memmem` (substring search), regexes
/// with `regex::bytes`. Both report the byte span of the first occurrence.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact substring match.
    Literal(String),

    /// Regular expression match.
    Regex(Regex),
}

impl Pattern {
    /// Create a literal pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Create a regex pattern.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Find the first occurrence in `haystack`, returning `(start, end)`.
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        match self {
            Pattern::Literal(text) => memchr::memmem::find(haystack, text.as_bytes())
                .map(|start| (start, start + text.len())),
            Pattern::Regex(re) => re.find(haystack).map(|m| (m.start(), m.end())),
        }
    }

    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Pattern::Literal(text) => format!("{:?}", text),
            Pattern::Regex(re) => format!("/{}/", re.as_str()),
        }
    }
}

/// A named candidate inside an [`ExpectSpec`].
#[derive(Debug, Clone)]
pub struct ExpectCandidate {
    /// Name reported on match and in timeout diagnostics.
    pub name: String,

    /// The pattern to search for.
    pub pattern: Pattern,
}

/// An ordered set of candidate patterns plus a timeout budget.
///
/// Candidate order is significant: when two candidates match at the same
/// buffer position, the lower index wins. Callers rely on this to check
/// specific patterns (a host-key confirmation, say) before generic ones
/// (a password prompt).
#[derive(Debug, Clone)]
pub struct ExpectSpec {
    candidates: Vec<ExpectCandidate>,
    timeout: Duration,
}

impl ExpectSpec {
    /// Create an empty spec with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            candidates: Vec::new(),
            timeout,
        }
    }

    /// Create a single-candidate spec.
    pub fn single(name: impl Into<String>, pattern: Pattern, timeout: Duration) -> Self {
        Self::new(timeout).candidate(name, pattern)
    }

    /// Append a candidate. Order of calls is the match-priority order.
    pub fn candidate(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        self.candidates.push(ExpectCandidate {
            name: name.into(),
            pattern,
        });
        self
    }

    /// The candidates, in priority order.
    pub fn candidates(&self) -> &[ExpectCandidate] {
        &self.candidates
    }

    /// The timeout budget for this expect step.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Comma-joined candidate names, for timeout diagnostics.
    pub fn describe(&self) -> String {
        self.candidates
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Scan `haystack` for the earliest-positioned candidate match.
    ///
    /// All candidates are evaluated; the one whose match starts first wins,
    /// and ties are broken by candidate index (lower wins). Returns byte
    /// offsets into `haystack`.
    pub fn scan(&self, haystack: &[u8]) -> Option<PatternHit> {
        let mut best: Option<PatternHit> = None;

        for (index, candidate) in self.candidates.iter().enumerate() {
            if let Some((start, end)) = candidate.pattern.find(haystack) {
                let better = match &best {
                    Some(hit) => start < hit.start,
                    None => true,
                };
                if better {
                    best = Some(PatternHit { index, start, end });
                }
            }
        }

        best
    }
}

/// A successful candidate match inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternHit {
    /// Index of the winning candidate in the spec's list.
    pub index: usize,

    /// Byte offset where the match starts.
    pub start: usize,

    /// Byte offset one past the end of the match.
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(candidates: &[(&str, Pattern)]) -> ExpectSpec {
        let mut spec = ExpectSpec::new(Duration::from_secs(1));
        for (name, pattern) in candidates {
            spec = spec.candidate(*name, pattern.clone());
        }
        spec
    }

    #[test]
    fn test_literal_find() {
        let pattern = Pattern::literal("Password:");
        assert_eq!(pattern.find(b"login\nPassword: "), Some((6, 15)));
        assert_eq!(pattern.find(b"Passwo"), None);
    }

    #[test]
    fn test_regex_find() {
        let pattern = Pattern::regex(r"\(config[^)]*\)#").unwrap();
        assert_eq!(pattern.find(b"R1(config-if)# "), Some((2, 14)));
        assert_eq!(pattern.find(b"R1# "), None);
    }

    #[test]
    fn test_earliest_position_wins() {
        let spec = spec(&[
            ("hash", Pattern::literal("#")),
            ("password", Pattern::literal("Password:")),
        ]);
        // "Password:" appears before "#": the later-listed candidate wins
        // because its match position is earlier.
        let hit = spec.scan(b"Password: then #").unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.start, 0);
    }

    #[test]
    fn test_tie_broken_by_candidate_order() {
        // Both candidates match at position 0; the lower index must win.
        let spec = spec(&[
            ("long", Pattern::literal("Password:")),
            ("short", Pattern::literal("Pass")),
        ]);
        let hit = spec.scan(b"Password: ").unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.end, 9);
    }

    #[test]
    fn test_no_match() {
        let spec = spec(&[("prompt", Pattern::literal("#"))]);
        assert!(spec.scan(b"still booting...").is_none());
    }

    #[test]
    fn test_mixed_literal_and_regex() {
        let spec = spec(&[
            (
                "confirm",
                Pattern::literal("Are you sure you want to continue connecting"),
            ),
            ("password", Pattern::regex(r"[Pp]assword:").unwrap()),
        ]);
        let hit = spec.scan(b"host key...\npassword: ").unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_describe() {
        let spec = spec(&[("a", Pattern::literal(">")), ("b", Pattern::literal("#"))]);
        assert_eq!(spec.describe(), "a, b");
    }
}
