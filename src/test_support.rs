//! Scripted in-memory streams for driving the engine in tests.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::channel::ByteStream;
use crate::error::ChannelError;

/// One step of a scripted device conversation, consumed per `recv` call.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver this chunk.
    Recv(String),

    /// Never deliver anything (forces the caller's timeout).
    Hang,

    /// Remote closes the stream.
    Eof,
}

/// A [`ByteStream`] that replays a fixed script and records writes.
///
/// An exhausted script behaves like a silent device (hangs), so a test that
/// expects more output than it scripted fails with a timeout rather than a
/// misleading end-of-stream.
pub struct ScriptedStream {
    steps: VecDeque<ScriptStep>,
    sent: Arc<Mutex<Vec<String>>>,
    close_count: Arc<AtomicUsize>,
}

impl ScriptedStream {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: steps.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
            close_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to every line written to the stream, in order.
    pub fn sent(&self) -> Arc<Mutex<Vec<String>>> {
        self.sent.clone()
    }

    /// Handle to the shutdown counter (asserting exactly-once release).
    pub fn close_count(&self) -> Arc<AtomicUsize> {
        self.close_count.clone()
    }
}

#[async_trait]
impl ByteStream for ScriptedStream {
    async fn recv(&mut self) -> Result<Option<Bytes>, ChannelError> {
        match self.steps.pop_front() {
            Some(ScriptStep::Recv(chunk)) => Ok(Some(Bytes::from(chunk))),
            Some(ScriptStep::Eof) => Ok(None),
            Some(ScriptStep::Hang) | None => {
                futures_util::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ChannelError> {
        self.close_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
