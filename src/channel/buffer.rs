//! Accumulating output buffer with ANSI stripping and match consumption.
//!
//! Raw transport chunks are fed through a `vte` parser on ingest, so escape
//! sequences are removed before any pattern is evaluated. The parser is kept
//! across chunks: an escape sequence split over two reads still strips
//! cleanly. Scanning only ever sees the unconsumed region, and a match is
//! consumed exactly once, yielding the "before text" that callers treat as a
//! command's response body.

use bytes::{Buf, BytesMut};

use super::patterns::{ExpectSpec, PatternHit};

/// Buffer for accumulating cleaned output and consuming pattern matches.
pub struct PatternBuffer {
    /// Unconsumed, already-stripped output.
    data: BytesMut,

    /// Stateful escape-sequence parser, persistent across chunks.
    parser: vte::Parser,
}

/// `vte` performer that keeps printable text and line-shaping controls.
struct PlainTextSink<'a> {
    out: &'a mut BytesMut,
}

impl vte::Perform for PlainTextSink<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }

    fn hook(&mut self, _params: &vte::Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(
        &mut self,
        _params: &vte::Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}

impl PatternBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(4096),
            parser: vte::Parser::new(),
        }
    }

    /// Append a raw transport chunk, stripping ANSI escape sequences.
    pub fn extend(&mut self, chunk: &[u8]) {
        let mut sink = PlainTextSink {
            out: &mut self.data,
        };
        self.parser.advance(&mut sink, chunk);
    }

    /// Scan the unconsumed region for the earliest candidate match.
    pub fn scan(&self, spec: &ExpectSpec) -> Option<PatternHit> {
        spec.scan(&self.data)
    }

    /// Consume through the end of `hit`, returning `(before, matched)` text.
    ///
    /// `before` is everything preceding the match start; `matched` is the
    /// match itself. Both are removed from the buffer, so a span is never
    /// matched twice.
    pub fn consume_match(&mut self, hit: PatternHit) -> (String, String) {
        let before = String::from_utf8_lossy(&self.data[..hit.start]).into_owned();
        let matched = String::from_utf8_lossy(&self.data[hit.start..hit.end]).into_owned();
        self.data.advance(hit.end);
        (before, matched)
    }

    /// Unconsumed content as a lossy string (diagnostics).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Take everything unconsumed, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.data).into_owned();
        self.data.clear();
        text
    }

    /// Unconsumed length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("unconsumed", &self.data.len())
            .finish()
    }
}
