// src/exec/logs.rs

//! Container output as a stream of byte chunks.

use tokio::sync::mpsc;

use crate::errors::RuntimeError;

/// Sending half used by runtime implementations to feed a [`LogStream`].
pub type LogSender = mpsc::Sender<Result<Vec<u8>, RuntimeError>>;

/// Chunks of container output, in arrival order.
///
/// An `Err` item reports a failure of the underlying stream; the stream is
/// over once every sender is dropped.
#[derive(Debug)]
pub struct LogStream {
    rx: mpsc::Receiver<Result<Vec<u8>, RuntimeError>>,
}

impl LogStream {
    pub fn channel(capacity: usize) -> (LogSender, LogStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, LogStream { rx })
    }

    /// A stream that yields `bytes` once and ends.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let (tx, stream) = Self::channel(1);
        // Capacity 1 and a fresh channel: cannot be full.
        let _ = tx.try_send(Ok(bytes));
        stream
    }

    pub async fn next_chunk(&mut self) -> Option<Result<Vec<u8>, RuntimeError>> {
        self.rx.recv().await
    }

    /// Drain the whole stream into memory.
    ///
    /// Blocks until the container's process ends. The first error aborts
    /// the read.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>, RuntimeError> {
        let mut body = Vec::new();
        while let Some(chunk) = self.next_chunk().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(body)
    }
}
