//! Scan engine - composes the frontier, worker pool, result channel
//! and stats monitor behind the public scan contract
//!
//! The engine validates the root up front (before any thread starts),
//! seeds the frontier, spawns the workers and the stats monitor, and
//! returns a `ScanHandle`: a lazy, finite, non-restartable iterator
//! of matched records. The handle is the sole reader of the result
//! channel; a slow consumer throttles the whole scan through the
//! channel's backpressure, which is intended.
//!
//! No ordering is guaranteed across records - emission order reflects
//! whichever worker finishes first.

use crate::config::ScanRequest;
use crate::error::{Result, ScanError};
use crate::scanner::channel::result_channel;
use crate::scanner::frontier::Frontier;
use crate::scanner::record::{DirectoryTask, FileRecord};
use crate::scanner::stats::{ProgressCallback, ScanStats, StatsMonitor, StatsSnapshot};
use crate::scanner::worker::Worker;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long the consumer waits between cancellation checks
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Orchestrates a single scan
pub struct ScanEngine {
    request: ScanRequest,
    cancel: Arc<AtomicBool>,
    progress: Option<ProgressCallback>,
}

impl ScanEngine {
    /// Create an engine for the given request
    pub fn new(request: ScanRequest) -> Self {
        Self {
            request,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        }
    }

    /// Get a clone of the cancellation flag (for signal handlers)
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Install a progress callback, invoked once per second
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Validate the root, start the pipeline, and return the record stream
    ///
    /// Fails fast with `RootNotFound` / `RootNotDirectory` before any
    /// worker is spawned.
    pub fn start(self) -> Result<ScanHandle> {
        let root_meta = fs::metadata(&self.request.root).map_err(|_| ScanError::RootNotFound {
            path: self.request.root.clone(),
        })?;
        if !root_meta.is_dir() {
            return Err(ScanError::RootNotDirectory {
                path: self.request.root.clone(),
            });
        }

        info!(
            root = %self.request.root.display(),
            workers = self.request.workers,
            buffer = self.request.result_buffer,
            max_depth = self.request.max_depth,
            "Starting scan"
        );

        let request = Arc::new(self.request);
        let frontier = Arc::new(Frontier::new(
            request.max_queue_size,
            request.memory_ceiling,
        ));
        let stats = Arc::new(ScanStats::new());
        let (result_tx, result_rx) = result_channel(request.result_buffer, Arc::clone(&self.cancel));

        // Seed before spawning so no worker can observe quiescence first
        frontier.push(DirectoryTask::root(request.root.clone()));

        let mut workers = Vec::with_capacity(request.workers);
        for id in 0..request.workers {
            let worker = Worker::spawn(
                id,
                Arc::clone(&request),
                Arc::clone(&frontier),
                result_tx.clone(),
                Arc::clone(&stats),
                Arc::clone(&self.cancel),
            );
            match worker {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    // Unwind anything already spawned before failing
                    self.cancel.store(true, Ordering::SeqCst);
                    drop(result_tx);
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(e.into());
                }
            }
        }
        // The engine keeps no sender: the channel disconnects exactly
        // when the last worker exits.
        drop(result_tx);

        let monitor = StatsMonitor::spawn(Arc::clone(&stats), Arc::clone(&frontier), self.progress);

        Ok(ScanHandle {
            receiver: result_rx,
            workers,
            monitor: Some(monitor),
            stats,
            frontier,
            cancel: self.cancel,
            finished: false,
        })
    }
}

/// Lazy, finite, non-restartable stream of matched records
///
/// Also exposes the live stats for the duration of the scan. Dropping
/// the handle before exhaustion cancels the scan and joins the pool.
#[derive(Debug)]
pub struct ScanHandle {
    receiver: Receiver<FileRecord>,
    workers: Vec<Worker>,
    monitor: Option<StatsMonitor>,
    stats: Arc<ScanStats>,
    frontier: Arc<Frontier>,
    cancel: Arc<AtomicBool>,
    finished: bool,
}

impl ScanHandle {
    /// Live counters for this scan
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Point-in-time snapshot including frontier and worker state
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(&self.frontier)
    }

    /// True once the scan has degraded to sequential traversal
    pub fn sequential_mode(&self) -> bool {
        self.frontier.sequential_mode()
    }

    /// Request cancellation; the pipeline unwinds within its polling
    /// intervals
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Join workers and stop the monitor; idempotent
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        for worker in std::mem::take(&mut self.workers) {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker failed to join cleanly");
            }
        }
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }

        info!(
            dirs = self.stats.dirs_processed(),
            deep_dirs = self.stats.deep_dirs(),
            matched = self.stats.files_matched(),
            errors = self.stats.errors(),
            elapsed_ms = self.stats.elapsed().as_millis() as u64,
            "Scan finished"
        );
    }
}

impl Iterator for ScanHandle {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        if self.finished {
            return None;
        }

        loop {
            match self.receiver.recv_timeout(RECV_POLL_INTERVAL) {
                Ok(record) => {
                    self.stats.record_match();
                    return Some(record);
                }
                // Still open: workers are scanning or unwinding after
                // a cancel; keep polling until they drop their senders
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.finish();
                    return None;
                }
            }
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.store(true, Ordering::SeqCst);
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FileFilter;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_root_not_found() {
        let engine = ScanEngine::new(ScanRequest::new("/definitely/not/here"));
        assert!(matches!(
            engine.start(),
            Err(ScanError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let engine = ScanEngine::new(ScanRequest::new(&file));
        assert!(matches!(
            engine.start(),
            Err(ScanError::RootNotDirectory { .. })
        ));
    }

    #[test]
    fn test_scan_yields_all_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.log"), b"b").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.txt"), b"c").unwrap();

        let request = ScanRequest::new(dir.path())
            .with_workers(2)
            .with_filter(FileFilter::new(None, ["txt"]));
        let handle = ScanEngine::new(request).start().unwrap();

        let names: HashSet<String> = handle.map(|r| r.file_name()).collect();
        assert_eq!(
            names,
            HashSet::from(["a.txt".to_string(), "c.txt".to_string()])
        );
    }

    #[test]
    fn test_matched_counter_tracks_yields() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.txt")), b"x").unwrap();
        }

        let mut handle = ScanEngine::new(ScanRequest::new(dir.path()))
            .start()
            .unwrap();
        let mut yielded = 0;
        while handle.next().is_some() {
            yielded += 1;
        }

        assert_eq!(yielded, 5);
        assert_eq!(handle.stats().files_matched(), 5);
    }

    #[test]
    fn test_cancelled_scan_terminates() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            let sub = dir.path().join(format!("d{i}"));
            fs::create_dir(&sub).unwrap();
            fs::write(sub.join("f.txt"), b"x").unwrap();
        }

        let engine = ScanEngine::new(ScanRequest::new(dir.path()));
        let cancel = engine.cancel_flag();
        let handle = engine.start().unwrap();
        cancel.store(true, Ordering::SeqCst);

        // Must drain and terminate rather than hang
        let count = handle.count();
        assert!(count <= 20);
    }

    #[test]
    fn test_dropping_handle_joins_pool() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let handle = ScanEngine::new(ScanRequest::new(dir.path()))
            .start()
            .unwrap();
        drop(handle);
    }
}
