//! Configuration types for dirscout
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The validated, immutable `ScanRequest` handed to the scan engine
//!
//! Validation happens once at the configuration boundary
//! (`ScanRequest::from_args`); programmatic construction via
//! `ScanRequest::new` and the `with_*` setters is not re-validated,
//! which keeps embedding and testing flexible.

use crate::error::ConfigError;
use crate::filter::FileFilter;
use clap::Parser;
use std::path::PathBuf;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 200;

/// Minimum result buffer capacity
pub const MIN_RESULT_BUFFER: usize = 10_000;

/// Minimum frontier size cap
pub const MIN_QUEUE_SIZE: usize = 1_000;

/// Minimum memory ceiling (64 MiB)
pub const MIN_MEMORY_CEILING: u64 = 64 * 1024 * 1024;

/// Parallel file finder with CSV output
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirscout",
    version,
    about = "Parallel file finder with CSV output",
    long_about = "Recursively scans a directory tree with a pool of worker threads,\n\
                  applies name/extension filters, and streams matching file metadata\n\
                  to a CSV file.\n\n\
                  Under memory or queue-depth pressure the scan degrades to\n\
                  sequential depth-first traversal to keep memory bounded.",
    after_help = "EXAMPLES:\n    \
        dirscout /data -o results.csv\n    \
        dirscout /data -e txt -e log -w 16\n    \
        dirscout /data -n report -e pdf --max-depth 8\n    \
        dirscout / --memory-limit 1024 --max-queue 50000 -q"
)]
pub struct CliArgs {
    /// Root directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "scan.csv", value_name = "FILE")]
    pub output: PathBuf,

    /// Only match files whose name contains this substring (case-insensitive)
    #[arg(short = 'n', long = "name", value_name = "SUBSTR")]
    pub name_contains: Option<String>,

    /// Only match files with this extension (can be repeated; dot optional)
    #[arg(short = 'e', long = "ext", value_name = "EXT", action = clap::ArgAction::Append)]
    pub extensions: Vec<String>,

    /// Number of worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Result buffer capacity (records held between scan and consumer)
    #[arg(long, default_value = "50000", value_name = "NUM")]
    pub result_buffer: usize,

    /// Maximum breadth-first depth; deeper subtrees are walked sequentially
    #[arg(short = 'd', long, default_value = "32", value_name = "NUM")]
    pub max_depth: u32,

    /// Frontier size cap before degrading to sequential traversal
    #[arg(long = "max-queue", default_value = "100000", value_name = "NUM")]
    pub max_queue_size: usize,

    /// Process memory ceiling in MiB before degrading to sequential traversal
    #[arg(long = "memory-limit", default_value = "2048", value_name = "MIB")]
    pub memory_limit_mib: u64,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show skipped directories and warnings)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // 2x CPU cores - directory listing is I/O bound
    (num_cpus::get() * 2).min(MAX_WORKERS)
}

/// Validated, immutable scan parameters
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Root directory to scan
    pub root: PathBuf,

    /// File name filter shared by all workers
    pub filter: FileFilter,

    /// Number of worker threads
    pub workers: usize,

    /// Result channel capacity
    pub result_buffer: usize,

    /// Maximum breadth-first depth (root = 0)
    pub max_depth: u32,

    /// Frontier size that trips the circuit breaker
    pub max_queue_size: usize,

    /// Process memory ceiling in bytes that trips the circuit breaker
    pub memory_ceiling: u64,
}

impl ScanRequest {
    /// Create a request with default limits for the given root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: FileFilter::match_all(),
            workers: default_workers(),
            result_buffer: 50_000,
            max_depth: 32,
            max_queue_size: 100_000,
            memory_ceiling: 2048 * 1024 * 1024,
        }
    }

    /// Set the file name filter
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the result channel capacity
    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity;
        self
    }

    /// Set the maximum breadth-first depth
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the frontier size cap
    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Set the memory ceiling in bytes
    pub fn with_memory_ceiling(mut self, bytes: u64) -> Self {
        self.memory_ceiling = bytes;
        self
    }

    /// Create and validate a request from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.result_buffer < MIN_RESULT_BUFFER {
            return Err(ConfigError::InvalidResultBuffer {
                size: args.result_buffer,
                min: MIN_RESULT_BUFFER,
            });
        }

        if args.max_queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.max_queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        let memory_ceiling = args.memory_limit_mib.saturating_mul(1024 * 1024);
        if memory_ceiling < MIN_MEMORY_CEILING {
            return Err(ConfigError::InvalidMemoryCeiling {
                bytes: memory_ceiling,
                min: MIN_MEMORY_CEILING,
            });
        }

        if let Some(parent) = args.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidOutputPath {
                    path: args.output.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        let filter = FileFilter::new(args.name_contains.as_deref(), &args.extensions);

        Ok(Self {
            root: args.root.clone(),
            filter,
            workers: args.workers,
            result_buffer: args.result_buffer,
            max_depth: args.max_depth,
            max_queue_size: args.max_queue_size,
            memory_ceiling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            root: PathBuf::from("/data"),
            output: PathBuf::from("scan.csv"),
            name_contains: None,
            extensions: vec![],
            workers: 8,
            result_buffer: 50_000,
            max_depth: 32,
            max_queue_size: 100_000,
            memory_limit_mib: 2048,
            quiet: false,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_args() {
        let request = ScanRequest::from_args(&base_args()).unwrap();
        assert_eq!(request.workers, 8);
        assert_eq!(request.memory_ceiling, 2048 * 1024 * 1024);
        assert!(request.filter.is_match_all());
    }

    #[test]
    fn test_invalid_worker_count() {
        let mut args = base_args();
        args.workers = 0;
        assert!(matches!(
            ScanRequest::from_args(&args),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));

        args.workers = MAX_WORKERS + 1;
        assert!(ScanRequest::from_args(&args).is_err());
    }

    #[test]
    fn test_invalid_result_buffer() {
        let mut args = base_args();
        args.result_buffer = 100;
        assert!(matches!(
            ScanRequest::from_args(&args),
            Err(ConfigError::InvalidResultBuffer { .. })
        ));
    }

    #[test]
    fn test_invalid_memory_limit() {
        let mut args = base_args();
        args.memory_limit_mib = 1;
        assert!(matches!(
            ScanRequest::from_args(&args),
            Err(ConfigError::InvalidMemoryCeiling { .. })
        ));
    }

    #[test]
    fn test_filter_built_from_args() {
        let mut args = base_args();
        args.extensions = vec!["txt".into(), ".LOG".into()];
        let request = ScanRequest::from_args(&args).unwrap();
        assert!(request.filter.matches("a.txt"));
        assert!(request.filter.matches("b.log"));
        assert!(!request.filter.matches("c.bin"));
    }

    #[test]
    fn test_builder_setters() {
        let request = ScanRequest::new("/tmp")
            .with_workers(4)
            .with_max_depth(2)
            .with_max_queue_size(500);
        assert_eq!(request.workers, 4);
        assert_eq!(request.max_depth, 2);
        assert_eq!(request.max_queue_size, 500);
    }
}
