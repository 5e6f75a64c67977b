//! Channel layer: pattern matching and interactive stream management.
//!
//! This module turns a raw byte stream into send/expect steps: ordered
//! candidate patterns, earliest-match selection, before-text capture, and
//! timeout handling.

mod buffer;
mod patterns;
mod shell;
mod stream;

pub use buffer::PatternBuffer;
pub use patterns::{ExpectCandidate, ExpectSpec, Pattern, PatternHit};
pub use shell::{Channel, ExpectMatch};
pub use stream::ByteStream;
