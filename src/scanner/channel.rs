//! Bounded result channel between workers and the consumer
//!
//! Matched records flow through a bounded MPSC buffer. When the
//! buffer is full the emitting worker blocks - that is the deliberate
//! backpressure coupling producer throughput to consumer speed while
//! keeping total memory bounded. The block is implemented as a
//! send-with-timeout loop so cancellation is observed within one
//! polling interval.
//!
//! Closing: every worker owns a sender clone and the engine drops its
//! own, so the channel disconnects exactly when the last worker exits
//! its loop. The consumer side sees disconnection only after all
//! buffered records have been drained.

use crate::scanner::record::FileRecord;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long an emit blocks before re-checking cancellation
const EMIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Create the result channel with the given capacity
pub fn result_channel(
    capacity: usize,
    cancel: Arc<AtomicBool>,
) -> (ResultSender, Receiver<FileRecord>) {
    let (tx, rx) = bounded(capacity);
    (ResultSender { tx, cancel }, rx)
}

/// Worker-side handle for emitting matched records
#[derive(Clone)]
pub struct ResultSender {
    tx: Sender<FileRecord>,
    cancel: Arc<AtomicBool>,
}

impl ResultSender {
    /// Emit a record, blocking while the buffer is full
    ///
    /// Returns false if the scan was cancelled or the consumer went
    /// away; the caller stops producing.
    pub fn emit(&self, record: FileRecord) -> bool {
        let mut record = record;
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return false;
            }
            match self.tx.send_timeout(record, EMIT_POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Timeout(returned)) => record = returned,
                Err(SendTimeoutError::Disconnected(_)) => return false,
            }
        }
    }
}
