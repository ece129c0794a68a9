//! Frontier - the shared breadth-first work queue with circuit breaker
//!
//! The frontier holds not-yet-expanded directories as an MPMC queue.
//! Every discovery event is routed through a single decision point
//! (`route`), which either enqueues the directory or hands it back to
//! the discovering worker for inline sequential expansion.
//!
//! The circuit breaker evaluates two independent pressure conditions
//! on every routing decision:
//! - frontier length over the configured cap
//! - estimated process memory over the configured ceiling
//!
//! Either condition flips the shared mode flag. The transition is a
//! single compare-and-set, one-way for the remainder of the scan:
//! once sequential mode is active, no discovered directory is ever
//! enqueued again.

use crate::scanner::record::DirectoryTask;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// How often the memory gauge refreshes its reading
const MEMORY_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Result of routing a discovered directory
#[derive(Debug)]
pub enum Routed {
    /// Task was enqueued on the frontier
    Queued,

    /// Task must be expanded inline by the discovering worker
    Inline(DirectoryTask),
}

/// Why the circuit breaker tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripReason {
    /// Frontier length exceeded the cap
    QueueDepth,

    /// Process memory exceeded the ceiling
    Memory,
}

/// Shared breadth-first work queue with a one-way circuit breaker
#[derive(Debug)]
pub struct Frontier {
    /// Task channel (unbounded; the cap below is a logical limit
    /// enforced by the breaker, not a blocking bound)
    sender: Sender<DirectoryTask>,
    receiver: Receiver<DirectoryTask>,

    /// Frontier length that trips the breaker
    max_queue_size: usize,

    /// Process memory ceiling in bytes that trips the breaker
    memory_ceiling: u64,

    /// Cached process memory probe
    gauge: MemoryGauge,

    /// Sequential-fallback mode flag; one-way false -> true
    sequential: AtomicBool,

    /// Workers currently expanding (or fetching) a task
    active: AtomicUsize,
}

impl Frontier {
    /// Create a frontier with the given breaker thresholds
    pub fn new(max_queue_size: usize, memory_ceiling: u64) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            max_queue_size,
            memory_ceiling,
            gauge: MemoryGauge::new(),
            sequential: AtomicBool::new(false),
            active: AtomicUsize::new(0),
        }
    }

    /// Push a task directly, bypassing the breaker (used for seeding)
    pub fn push(&self, task: DirectoryTask) {
        // Both ends live inside self, so the channel cannot disconnect
        let _ = self.sender.send(task);
    }

    /// Try to pop a task without blocking
    pub fn try_pop(&self) -> Option<DirectoryTask> {
        self.receiver.try_recv().ok()
    }

    /// Current frontier length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Route a discovered directory: enqueue, or hand back for inline
    /// expansion when sequential mode is (or becomes) active
    pub fn route(&self, task: DirectoryTask) -> Routed {
        if self.sequential.load(Ordering::Acquire) {
            return Routed::Inline(task);
        }

        if self.len() > self.max_queue_size {
            self.trip(TripReason::QueueDepth);
            return Routed::Inline(task);
        }

        let memory = self.gauge.current();
        if memory > self.memory_ceiling {
            self.trip(TripReason::Memory);
            return Routed::Inline(task);
        }

        self.push(task);
        Routed::Queued
    }

    /// Flip the mode flag; idempotent under concurrent trippers
    fn trip(&self, reason: TripReason) {
        if self
            .sequential
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            warn!(
                ?reason,
                queue_len = self.len(),
                memory_bytes = self.gauge.current(),
                "Circuit breaker tripped, degrading to sequential traversal"
            );
        }
    }

    /// True once the scan has degraded to sequential traversal
    pub fn sequential_mode(&self) -> bool {
        self.sequential.load(Ordering::Acquire)
    }

    /// Mark a worker as active (fetching or expanding)
    pub fn begin_work(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark a worker as idle
    pub fn end_work(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of workers currently active
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Quiescence condition: no active worker and nothing queued
    ///
    /// A single observation admits a race with an in-flight push, so
    /// callers confirm with a delayed re-check before terminating.
    pub fn is_quiet(&self) -> bool {
        self.active.load(Ordering::SeqCst) == 0 && self.receiver.is_empty()
    }
}

/// RAII guard marking a worker as active for the guard's lifetime
pub struct ActiveGuard<'a> {
    frontier: &'a Frontier,
}

impl<'a> ActiveGuard<'a> {
    /// Mark the worker active until the guard drops
    pub fn new(frontier: &'a Frontier) -> Self {
        frontier.begin_work();
        Self { frontier }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.frontier.end_work();
    }
}

/// Throttled process-memory probe feeding the circuit breaker
///
/// Refreshing process info is not free, so readings are cached and
/// refreshed at most every `MEMORY_REFRESH_INTERVAL`. Concurrent
/// callers that lose the refresh race read the cached value.
#[derive(Debug)]
struct MemoryGauge {
    inner: Mutex<GaugeInner>,
    cached: AtomicU64,
}

#[derive(Debug)]
struct GaugeInner {
    system: System,
    pid: Option<Pid>,
    last_refresh: Instant,
}

impl MemoryGauge {
    fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            debug!("Current PID unavailable, memory breaker disabled");
        }

        let mut system = System::new();
        let cached = AtomicU64::new(0);
        if let Some(pid) = pid {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(process) = system.process(pid) {
                cached.store(process.memory(), Ordering::Relaxed);
            }
        }

        Self {
            inner: Mutex::new(GaugeInner {
                system,
                pid,
                last_refresh: Instant::now(),
            }),
            cached,
        }
    }

    /// Estimated process memory in bytes (cached, refreshed at interval)
    fn current(&self) -> u64 {
        if let Ok(mut inner) = self.inner.try_lock() {
            if inner.last_refresh.elapsed() >= MEMORY_REFRESH_INTERVAL {
                if let Some(pid) = inner.pid {
                    inner.system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                    if let Some(process) = inner.system.process(pid) {
                        self.cached.store(process.memory(), Ordering::Relaxed);
                    }
                }
                inner.last_refresh = Instant::now();
            }
        }
        self.cached.load(Ordering::Relaxed)
    }
}
