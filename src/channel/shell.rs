//! Interactive channel: line-oriented sends and pattern-bounded reads.

use std::time::{Duration, Instant};

use log::{debug, trace};
use secrecy::{ExposeSecret, SecretString};

use super::buffer::PatternBuffer;
use super::patterns::ExpectSpec;
use super::stream::ByteStream;
use crate::error::ChannelError;

/// Outcome of a successful expect step.
#[derive(Debug, Clone)]
pub struct ExpectMatch {
    /// Index of the winning candidate in the spec.
    pub index: usize,

    /// Name of the winning candidate.
    pub name: String,

    /// Output collected before the match start.
    pub before: String,

    /// The matched text itself.
    pub matched: String,

    /// Wall-clock time spent waiting.
    pub elapsed: Duration,
}

/// A live interactive channel over some [`ByteStream`].
///
/// Owns the stream exclusively. All reads go through the internal
/// [`PatternBuffer`], so output spanning multiple transport chunks is
/// matched correctly and nothing is lost between expect steps.
pub struct Channel {
    stream: Option<Box<dyn ByteStream>>,
    buffer: PatternBuffer,
}

impl Channel {
    /// Wrap a stream in a new channel.
    pub fn new(stream: Box<dyn ByteStream>) -> Self {
        Self {
            stream: Some(stream),
            buffer: PatternBuffer::new(),
        }
    }

    /// Whether the underlying stream is still held.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send `line` followed by a newline.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        trace!("send: {:?}", line);
        self.write_line(line).await
    }

    /// Send a secret followed by a newline. The value is never logged.
    pub async fn send_secret_line(&mut self, secret: &SecretString) -> Result<(), ChannelError> {
        trace!("send: <redacted>");
        self.write_line(secret.expose_secret()).await
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
        stream.send(&payload).await
    }

    /// Block until one of the spec's candidates matches, the timeout
    /// elapses, or the stream ends.
    ///
    /// Buffered output is checked before any read, so a prompt that arrived
    /// with a previous chunk is found without touching the transport. On a
    /// match the buffer is consumed through the match end and the preceding
    /// text is returned.
    pub async fn expect(&mut self, spec: &ExpectSpec) -> Result<ExpectMatch, ChannelError> {
        let start = Instant::now();
        let deadline = start + spec.timeout();

        loop {
            if let Some(hit) = self.buffer.scan(spec) {
                let (before, matched) = self.buffer.consume_match(hit);
                let name = spec.candidates()[hit.index].name.clone();
                let elapsed = start.elapsed();
                debug!("matched {:?} after {:?}", name, elapsed);
                return Ok(ExpectMatch {
                    index: hit.index,
                    name,
                    before,
                    matched,
                    elapsed,
                });
            }

            let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("timed out waiting for [{}]", spec.describe());
                return Err(ChannelError::PatternTimeout(spec.timeout()));
            }

            match tokio::time::timeout(remaining, stream.recv()).await {
                Err(_) => {
                    debug!("timed out waiting for [{}]", spec.describe());
                    return Err(ChannelError::PatternTimeout(spec.timeout()));
                }
                Ok(Err(e)) => return Err(e),
                Ok(Ok(None)) => {
                    debug!("stream ended waiting for [{}]", spec.describe());
                    return Err(ChannelError::Closed);
                }
                Ok(Ok(Some(chunk))) => {
                    trace!("recv: {} bytes", chunk.len());
                    self.buffer.extend(&chunk);
                }
            }
        }
    }

    /// Discard everything currently buffered, returning it.
    pub fn drain_buffer(&mut self) -> String {
        self.buffer.take()
    }

    /// Release the underlying stream. Idempotent: the second and later calls
    /// are no-ops, so a close on an already-failed channel is safe.
    pub async fn close(&mut self) -> Result<(), ChannelError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("open", &self.is_open())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::channel::patterns::Pattern;
    use crate::test_support::{ScriptStep, ScriptedStream};

    fn spec(timeout_ms: u64, candidates: &[(&str, &str)]) -> ExpectSpec {
        let mut spec = ExpectSpec::new(Duration::from_millis(timeout_ms));
        for (name, literal) in candidates {
            spec = spec.candidate(*name, Pattern::literal(*literal));
        }
        spec
    }

    #[tokio::test]
    async fn test_match_spanning_multiple_reads() {
        let stream = ScriptedStream::new(vec![
            ScriptStep::Recv("show ver output\r\n".into()),
            ScriptStep::Recv("R1".into()),
            ScriptStep::Recv("# ".into()),
        ]);
        let mut channel = Channel::new(Box::new(stream));

        let m = channel
            .expect(&spec(500, &[("prompt", "#")]))
            .await
            .unwrap();
        assert_eq!(m.name, "prompt");
        assert_eq!(m.before, "show ver output\r\nR1");
    }

    #[tokio::test]
    async fn test_no_false_positive_on_partial_literal() {
        // "Passwo" alone must not match; the completion must.
        let stream = ScriptedStream::new(vec![
            ScriptStep::Recv("Passwo".into()),
            ScriptStep::Recv("rd: ".into()),
        ]);
        let mut channel = Channel::new(Box::new(stream));

        let m = channel
            .expect(&spec(500, &[("password", "Password:")]))
            .await
            .unwrap();
        assert_eq!(m.before, "");
        assert_eq!(m.matched, "Password:");
    }

    #[tokio::test]
    async fn test_timeout_is_not_a_match() {
        let stream = ScriptedStream::new(vec![ScriptStep::Hang]);
        let mut channel = Channel::new(Box::new(stream));

        let err = channel
            .expect(&spec(50, &[("prompt", "#")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::PatternTimeout(_)));
    }

    #[tokio::test]
    async fn test_eof_reported() {
        let stream = ScriptedStream::new(vec![
            ScriptStep::Recv("goodbye".into()),
            ScriptStep::Eof,
        ]);
        let mut channel = Channel::new(Box::new(stream));

        let err = channel
            .expect(&spec(500, &[("prompt", "#")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
    }

    #[tokio::test]
    async fn test_buffered_data_checked_before_read() {
        let stream = ScriptedStream::new(vec![ScriptStep::Recv("a> b# ".into())]);
        let mut channel = Channel::new(Box::new(stream));

        // First expect pulls the chunk and consumes through ">".
        let m = channel.expect(&spec(500, &[("user", ">")])).await.unwrap();
        assert_eq!(m.before, "a");

        // Second expect is satisfied from the buffer alone; the script has
        // no more chunks to give.
        let m = channel.expect(&spec(500, &[("priv", "#")])).await.unwrap();
        assert_eq!(m.before, " b");
    }

    #[tokio::test]
    async fn test_ordered_candidates_with_elapsed() {
        let stream = ScriptedStream::new(vec![ScriptStep::Recv("Password: ".into())]);
        let mut channel = Channel::new(Box::new(stream));

        let m = channel
            .expect(&spec(500, &[("confirm", "continue connecting"), ("password", "Password:")]))
            .await
            .unwrap();
        assert_eq!(m.index, 1);
        assert!(m.elapsed <= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_close_idempotent() {
        let stream = ScriptedStream::new(vec![]);
        let closes = stream.close_count();
        let mut channel = Channel::new(Box::new(stream));

        channel.close().await.unwrap();
        channel.close().await.unwrap();
        assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let stream = ScriptedStream::new(vec![]);
        let mut channel = Channel::new(Box::new(stream));
        channel.close().await.unwrap();

        let err = channel.send_line("show version").await.unwrap_err();
        assert!(matches!(err, ChannelError::Closed));
    }

    #[test]
    fn test_sent_lines_terminated() {
        tokio_test::block_on(async {
            let stream = ScriptedStream::new(vec![]);
            let sent = stream.sent();
            let mut channel = Channel::new(Box::new(stream));

            channel.send_line("enable").await.unwrap();
            channel
                .send_secret_line(&SecretString::from("class123!".to_string()))
                .await
                .unwrap();

            let sent = sent.lock().unwrap();
            assert_eq!(sent.as_slice(), ["enable\n", "class123!\n"]);
        });
    }
}
