//! Worker threads: directory expansion and termination detection
//!
//! Each worker loops over the frontier: pop a task, expand the
//! directory (discover subdirectories, filter and emit files), repeat.
//! Discovered subdirectories are routed through the frontier, which
//! either enqueues them for the pool or hands them back for inline
//! sequential expansion once the circuit breaker has tripped.
//!
//! Termination is detected independently by each idle worker: when no
//! worker is active and the frontier is empty, the worker waits a
//! confirmation interval and re-checks before exiting. The second
//! check closes the race where a subdirectory push is in flight at the
//! instant another worker observes emptiness.
//!
//! A panic inside a single task expansion is caught at the task
//! boundary; the worker logs it and proceeds to its next task.

use crate::config::ScanRequest;
use crate::error::{ExpandOutcome, WorkerError};
use crate::scanner::channel::ResultSender;
use crate::scanner::frontier::{ActiveGuard, Frontier, Routed};
use crate::scanner::record::{DirectoryTask, FileRecord};
use crate::scanner::stats::ScanStats;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Sleep between polls when the frontier is empty
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Delay before re-confirming quiescence
const QUIESCENCE_CONFIRM_INTERVAL: Duration = Duration::from_millis(100);

/// Everything a worker needs to expand directories
struct ExpandCtx<'a> {
    request: &'a ScanRequest,
    frontier: &'a Frontier,
    results: &'a ResultSender,
    stats: &'a ScanStats,
    cancel: &'a AtomicBool,
}

impl ExpandCtx<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

/// A worker thread that expands directory tasks
#[derive(Debug)]
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        request: Arc<ScanRequest>,
        frontier: Arc<Frontier>,
        results: ResultSender,
        stats: Arc<ScanStats>,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name(format!("scout-{id}"))
            .spawn(move || {
                worker_loop(id, request, frontier, results, stats, cancel);
            })
            .map_err(|e| WorkerError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "Worker thread panicked".into(),
            })?;
        }
        Ok(())
    }
}

/// Main worker loop with the quiescence protocol
fn worker_loop(
    id: usize,
    request: Arc<ScanRequest>,
    frontier: Arc<Frontier>,
    results: ResultSender,
    stats: Arc<ScanStats>,
    cancel: Arc<AtomicBool>,
) {
    debug!(worker = id, "Worker starting");

    let ctx = ExpandCtx {
        request: &request,
        frontier: &frontier,
        results: &results,
        stats: &stats,
        cancel: &cancel,
    };

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        // Mark active before popping so the quiescence check cannot
        // observe "no active worker" while a task is held between the
        // pop and the expansion.
        let guard = ActiveGuard::new(&frontier);

        let Some(task) = frontier.try_pop() else {
            drop(guard);
            thread::sleep(IDLE_POLL_INTERVAL);

            if frontier.is_quiet() {
                // A discovery push may be in flight; confirm after a
                // longer delay before declaring the scan complete.
                thread::sleep(QUIESCENCE_CONFIRM_INTERVAL);
                if frontier.is_quiet() {
                    debug!(worker = id, "Quiescence confirmed");
                    break;
                }
            }
            continue;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| expand_directory(&task, &ctx)));
        drop(guard);

        match outcome {
            Ok(ExpandOutcome::Success {
                path,
                matched,
                subdirs,
            }) => {
                trace!(worker = id, path = %path.display(), matched, subdirs, "Directory expanded");
            }
            Ok(ExpandOutcome::Skipped { path, reason }) => {
                debug!(worker = id, path = %path.display(), reason = %reason, "Directory skipped");
            }
            Ok(ExpandOutcome::Cancelled) => break,
            Err(_) => {
                stats.record_error();
                warn!(
                    worker = id,
                    path = %task.path.display(),
                    "Task expansion panicked, continuing with next task"
                );
            }
        }
    }

    debug!(worker = id, "Worker exiting");
}

/// Expand a dequeued directory (the breadth-first step)
///
/// Subdirectories are routed through the frontier; files are filtered
/// and emitted. Past `max_depth` the whole subtree degrades to the
/// sequential walk without touching the global mode flag.
fn expand_directory(task: &DirectoryTask, ctx: &ExpandCtx) -> ExpandOutcome {
    if task.depth >= ctx.request.max_depth {
        return expand_sequential(task.clone(), ctx);
    }

    let reader = match fs::read_dir(&task.path) {
        Ok(reader) => reader,
        Err(e) => {
            ctx.stats.record_error();
            return ExpandOutcome::Skipped {
                path: task.path.clone(),
                reason: e.to_string(),
            };
        }
    };
    ctx.stats.record_dir();

    let mut matched = 0;
    let mut subdirs = 0;

    for entry in reader {
        if ctx.cancelled() {
            return ExpandOutcome::Cancelled;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                ctx.stats.record_error();
                debug!(path = %task.path.display(), error = %e, "Listing entry failed");
                continue;
            }
        };

        // file_type does not follow symlinks; links and special files
        // are skipped to keep the visit-once invariant
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "File type unavailable, skipping");
                continue;
            }
        };

        if file_type.is_dir() {
            subdirs += 1;
            let sub = DirectoryTask::new(entry.path(), task.depth + 1);
            if let Routed::Inline(sub) = ctx.frontier.route(sub) {
                match expand_sequential(sub, ctx) {
                    ExpandOutcome::Cancelled => return ExpandOutcome::Cancelled,
                    ExpandOutcome::Success { matched: m, .. } => matched += m,
                    ExpandOutcome::Skipped { .. } => {}
                }
            }
        } else if file_type.is_file() {
            match process_file(&entry, task.depth + 1, ctx) {
                FileOutcome::Emitted => matched += 1,
                FileOutcome::Skipped => {}
                FileOutcome::Cancelled => return ExpandOutcome::Cancelled,
            }
        }
    }

    ExpandOutcome::Success {
        path: task.path.clone(),
        matched,
        subdirs,
    }
}

/// Expand a subtree depth-first (the sequential fallback)
///
/// Pure LIFO walk with an explicit work stack: files first, then
/// subdirectories in directory order. No queue, no fan-out. Used for
/// breaker-tripped subtrees and for subtrees past `max_depth`.
fn expand_sequential(task: DirectoryTask, ctx: &ExpandCtx) -> ExpandOutcome {
    let root = task.path.clone();
    let mut matched = 0;
    let mut subdirs_total = 0;
    let mut stack = vec![task];

    while let Some(current) = stack.pop() {
        if ctx.cancelled() {
            return ExpandOutcome::Cancelled;
        }

        let reader = match fs::read_dir(&current.path) {
            Ok(reader) => reader,
            Err(e) => {
                ctx.stats.record_error();
                debug!(path = %current.path.display(), error = %e, "Directory skipped in sequential walk");
                continue;
            }
        };
        ctx.stats.record_dir();
        ctx.stats.record_deep_dir();

        let mut subdirs = Vec::new();
        for entry in reader {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    ctx.stats.record_error();
                    debug!(path = %current.path.display(), error = %e, "Listing entry failed");
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                subdirs.push(DirectoryTask::new(entry.path(), current.depth + 1));
            } else if file_type.is_file() {
                match process_file(&entry, current.depth + 1, ctx) {
                    FileOutcome::Emitted => matched += 1,
                    FileOutcome::Skipped => {}
                    FileOutcome::Cancelled => return ExpandOutcome::Cancelled,
                }
            }
        }

        subdirs_total += subdirs.len();

        // Reverse push so the first subdirectory is expanded next,
        // preserving recursive depth-first order
        for sub in subdirs.into_iter().rev() {
            stack.push(sub);
        }
    }

    ExpandOutcome::Success {
        path: root,
        matched,
        subdirs: subdirs_total,
    }
}

/// Result of filtering and emitting a single file
enum FileOutcome {
    Emitted,
    Skipped,
    Cancelled,
}

/// Filter a file, fetch its metadata, and emit it to the consumer
///
/// Metadata failures skip this file only; the rest of the directory
/// continues.
fn process_file(entry: &fs::DirEntry, depth: u32, ctx: &ExpandCtx) -> FileOutcome {
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if !ctx.request.filter.matches(&name) {
        return FileOutcome::Skipped;
    }

    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(path = %entry.path().display(), error = %e, "Metadata fetch failed, skipping file");
            return FileOutcome::Skipped;
        }
    };

    let record = match FileRecord::from_metadata(entry.path(), depth, &metadata) {
        Ok(record) => record,
        Err(e) => {
            debug!(path = %entry.path().display(), error = %e, "Modification time unavailable, skipping file");
            return FileOutcome::Skipped;
        }
    };

    if ctx.results.emit(record) {
        FileOutcome::Emitted
    } else {
        FileOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FileFilter;
    use crate::scanner::channel::result_channel;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct Harness {
        request: ScanRequest,
        frontier: Frontier,
        stats: ScanStats,
        cancel: AtomicBool,
    }

    impl Harness {
        fn new(request: ScanRequest) -> Self {
            Self {
                frontier: Frontier::new(request.max_queue_size, request.memory_ceiling),
                request,
                stats: ScanStats::new(),
                cancel: AtomicBool::new(false),
            }
        }

        fn ctx<'a>(&'a self, results: &'a ResultSender) -> ExpandCtx<'a> {
            ExpandCtx {
                request: &self.request,
                frontier: &self.frontier,
                results,
                stats: &self.stats,
                cancel: &self.cancel,
            }
        }
    }

    fn make_tree(root: &std::path::Path) {
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("b.log"), b"b").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("c.txt"), b"c").unwrap();
    }

    fn emitted_names(rx: &crossbeam_channel::Receiver<FileRecord>) -> HashSet<String> {
        rx.try_iter().map(|r| r.file_name()).collect()
    }

    #[test]
    fn test_expand_discovers_files_and_subdirs() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let harness = Harness::new(ScanRequest::new(dir.path()));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = result_channel(100, cancel);
        let ctx = harness.ctx(&tx);

        let task = DirectoryTask::root(dir.path().to_path_buf());
        let outcome = expand_directory(&task, &ctx);

        match outcome {
            ExpandOutcome::Success {
                matched, subdirs, ..
            } => {
                assert_eq!(matched, 2);
                assert_eq!(subdirs, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // The subdirectory was routed to the frontier, not expanded
        assert_eq!(harness.frontier.len(), 1);
        let names = emitted_names(&rx);
        assert!(names.contains("a.txt"));
        assert!(names.contains("b.log"));
        assert!(!names.contains("c.txt"));
    }

    #[test]
    fn test_expand_applies_filter() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let request =
            ScanRequest::new(dir.path()).with_filter(FileFilter::new(None, ["txt"]));
        let harness = Harness::new(request);
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = result_channel(100, cancel);
        let ctx = harness.ctx(&tx);

        let task = DirectoryTask::root(dir.path().to_path_buf());
        expand_directory(&task, &ctx);

        let names = emitted_names(&rx);
        assert_eq!(names, HashSet::from(["a.txt".to_string()]));
    }

    #[test]
    fn test_sequential_walks_whole_subtree() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let harness = Harness::new(ScanRequest::new(dir.path()));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = result_channel(100, cancel);
        let ctx = harness.ctx(&tx);

        let outcome = expand_sequential(DirectoryTask::root(dir.path().to_path_buf()), &ctx);
        assert!(outcome.is_success());

        let names = emitted_names(&rx);
        assert_eq!(names.len(), 3);
        assert!(names.contains("c.txt"));

        // Nothing touched the frontier
        assert!(harness.frontier.is_empty());
        assert_eq!(harness.stats.deep_dirs(), 2);
    }

    #[test]
    fn test_max_depth_degrades_locally() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let request = ScanRequest::new(dir.path()).with_max_depth(0);
        let harness = Harness::new(request);
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = result_channel(100, cancel);
        let ctx = harness.ctx(&tx);

        let task = DirectoryTask::root(dir.path().to_path_buf());
        let outcome = expand_directory(&task, &ctx);
        assert!(outcome.is_success());

        // Whole tree walked sequentially, global flag untouched
        assert_eq!(emitted_names(&rx).len(), 3);
        assert!(!harness.frontier.sequential_mode());
        assert!(harness.frontier.is_empty());
    }

    #[test]
    fn test_unreadable_directory_is_counted_and_skipped() {
        let harness = Harness::new(ScanRequest::new("/nonexistent"));
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, _rx) = result_channel(100, cancel);
        let ctx = harness.ctx(&tx);

        let task = DirectoryTask::root(PathBuf::from("/nonexistent/dir"));
        let outcome = expand_directory(&task, &ctx);
        assert!(matches!(outcome, ExpandOutcome::Skipped { .. }));
        assert_eq!(harness.stats.errors(), 1);
    }

    #[test]
    fn test_worker_pool_drains_frontier() {
        let dir = tempdir().unwrap();
        make_tree(dir.path());

        let request = Arc::new(ScanRequest::new(dir.path()).with_workers(4));
        let frontier = Arc::new(Frontier::new(
            request.max_queue_size,
            request.memory_ceiling,
        ));
        let stats = Arc::new(ScanStats::new());
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = result_channel(100, Arc::clone(&cancel));

        frontier.push(DirectoryTask::root(dir.path().to_path_buf()));

        let workers: Vec<Worker> = (0..4)
            .map(|id| {
                Worker::spawn(
                    id,
                    Arc::clone(&request),
                    Arc::clone(&frontier),
                    tx.clone(),
                    Arc::clone(&stats),
                    Arc::clone(&cancel),
                )
                .unwrap()
            })
            .collect();
        drop(tx);

        let names: HashSet<String> = rx.iter().map(|r| r.file_name()).collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(names.len(), 3);
        assert_eq!(stats.dirs_processed(), 2);
        assert!(frontier.is_quiet());
    }
}
