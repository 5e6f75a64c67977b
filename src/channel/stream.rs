//! Byte-stream seam between the channel layer and the transport.
//!
//! The engine never talks to a transport library directly: it drives a
//! [`ByteStream`], which production code implements over a russh PTY+shell
//! channel and tests implement with scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ChannelError;

/// An interactive byte stream: ordered chunks in, line-oriented writes out.
#[async_trait]
pub trait ByteStream: Send {
    /// Receive the next chunk of output.
    ///
    /// Blocks until data arrives; returns `Ok(None)` when the remote side
    /// has closed the stream.
    async fn recv(&mut self) -> Result<Option<Bytes>, ChannelError>;

    /// Write raw bytes to the remote side.
    async fn send(&mut self, data: &[u8]) -> Result<(), ChannelError>;

    /// Release the underlying transport resource. Must be safe to call once;
    /// the channel layer guarantees it is not called twice.
    async fn shutdown(&mut self) -> Result<(), ChannelError>;
}
