//! Scan statistics and the background monitor
//!
//! All counters are shared atomics updated with relaxed increments;
//! nothing here influences scan control flow. The monitor thread runs
//! on a fixed 1-second cadence, derives a directories/sec rate from
//! the monotonic counter, and drives the optional progress callback.

use crate::scanner::frontier::Frontier;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sampling cadence of the stats monitor
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Callback invoked with each periodic stats snapshot
pub type ProgressCallback = Box<dyn Fn(&StatsSnapshot) + Send + 'static>;

/// Shared scan counters
#[derive(Debug)]
pub struct ScanStats {
    /// Directories expanded (breadth-first and sequential)
    dirs_processed: AtomicU64,

    /// Directories expanded via the sequential fallback
    deep_dirs: AtomicU64,

    /// Records yielded to the consumer
    files_matched: AtomicU64,

    /// Directory-level errors (listing failures)
    errors: AtomicU64,

    /// Latest derived directories/sec rate (f64 bits)
    dirs_per_sec: AtomicU64,

    /// Scan start time
    started: Instant,
}

impl ScanStats {
    /// Create zeroed stats anchored at the current instant
    pub fn new() -> Self {
        Self {
            dirs_processed: AtomicU64::new(0),
            deep_dirs: AtomicU64::new(0),
            files_matched: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            dirs_per_sec: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_dir(&self) {
        self.dirs_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deep_dir(&self) {
        self.deep_dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.files_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dirs_processed(&self) -> u64 {
        self.dirs_processed.load(Ordering::Relaxed)
    }

    pub fn deep_dirs(&self) -> u64 {
        self.deep_dirs.load(Ordering::Relaxed)
    }

    pub fn files_matched(&self) -> u64 {
        self.files_matched.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Elapsed time since scan start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn store_rate(&self, rate: f64) {
        self.dirs_per_sec.store(rate.to_bits(), Ordering::Relaxed);
    }

    /// Latest sampled directories/sec rate
    pub fn dirs_per_sec(&self) -> f64 {
        f64::from_bits(self.dirs_per_sec.load(Ordering::Relaxed))
    }

    /// Capture a snapshot including frontier/worker state
    pub fn snapshot(&self, frontier: &Frontier) -> StatsSnapshot {
        StatsSnapshot {
            dirs_processed: self.dirs_processed(),
            deep_dirs: self.deep_dirs(),
            files_matched: self.files_matched(),
            errors: self.errors(),
            frontier_len: frontier.len(),
            active_workers: frontier.active_workers(),
            sequential_mode: frontier.sequential_mode(),
            dirs_per_sec: self.dirs_per_sec(),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the scan, for progress display
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub dirs_processed: u64,
    pub deep_dirs: u64,
    pub files_matched: u64,
    pub errors: u64,
    pub frontier_len: usize,
    pub active_workers: usize,
    pub sequential_mode: bool,
    pub dirs_per_sec: f64,
    pub elapsed: Duration,
}

/// Background sampler deriving throughput from the dirs counter
#[derive(Debug)]
pub struct StatsMonitor {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl StatsMonitor {
    /// Spawn the monitor thread
    pub fn spawn(
        stats: Arc<ScanStats>,
        frontier: Arc<Frontier>,
        callback: Option<ProgressCallback>,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("stats-monitor".into())
            .spawn(move || {
                monitor_loop(stats, frontier, callback, stop_flag);
            })
            .ok();

        if handle.is_none() {
            warn!("Failed to spawn stats monitor, progress sampling disabled");
        }

        Self { handle, stop }
    }

    /// Stop the monitor and wait for it to exit
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn monitor_loop(
    stats: Arc<ScanStats>,
    frontier: Arc<Frontier>,
    callback: Option<ProgressCallback>,
    stop: Arc<AtomicBool>,
) {
    let mut last_dirs = stats.dirs_processed();
    let mut last_sample = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        thread::sleep(SAMPLE_INTERVAL);

        let dirs = stats.dirs_processed();
        let elapsed = last_sample.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            (dirs.saturating_sub(last_dirs)) as f64 / elapsed
        } else {
            0.0
        };
        stats.store_rate(rate);
        last_dirs = dirs;
        last_sample = Instant::now();

        let snapshot = stats.snapshot(&frontier);
        debug!(
            dirs = snapshot.dirs_processed,
            matched = snapshot.files_matched,
            errors = snapshot.errors,
            queue = snapshot.frontier_len,
            active = snapshot.active_workers,
            sequential = snapshot.sequential_mode,
            dirs_per_sec = snapshot.dirs_per_sec,
            "Scan progress"
        );

        if let Some(ref cb) = callback {
            cb(&snapshot);
        }
    }
}
