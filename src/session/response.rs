//! Captured output of one command execution.

use std::time::Duration;

/// Output captured between a command and its terminating prompt.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized: command echo and trailing prompt
    /// remnant removed).
    pub text: String,

    /// The raw before-text as captured from the channel.
    pub raw: String,

    /// The prompt text that terminated the capture.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure substring found in the output, if any.
    pub failure_message: Option<String>,
}

impl CapturedOutput {
    /// Check whether the output carried no failure marker.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Iterate over the normalized output lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Check if the normalized output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.text.contains(pattern)
    }
}

impl std::fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
