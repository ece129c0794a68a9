//! dirscout - Parallel File Finder
//!
//! Recursively enumerates a directory tree with a pool of worker
//! threads, applies name/extension filters, and streams matching file
//! metadata to a consumer. Designed for trees with hundreds of
//! thousands to millions of entries while keeping memory bounded.
//!
//! # Features
//!
//! - **Parallel Scanning**: A worker pool drains a shared breadth-first
//!   frontier of directories, discovering subtrees and files
//!   concurrently.
//!
//! - **Bounded Memory**: Matched records flow through a bounded channel
//!   with backpressure; a one-way circuit breaker degrades the scan to
//!   sequential depth-first traversal when the frontier or process
//!   memory grows past its limits.
//!
//! - **Resilient**: Permission and I/O failures on individual
//!   directories or files are counted and skipped; the scan completes
//!   on hostile or partially inaccessible filesystems.
//!
//! - **Streaming CSV Output**: Records are written as they arrive, so
//!   result size never accumulates in memory.
//!
//! # Example
//!
//! ```no_run
//! use dirscout::{FileFilter, ScanEngine, ScanRequest};
//!
//! let request = ScanRequest::new("/data")
//!     .with_filter(FileFilter::new(Some("report"), ["pdf", "xlsx"]))
//!     .with_workers(8);
//!
//! let handle = ScanEngine::new(request).start()?;
//! for record in handle {
//!     println!("{} ({} bytes)", record.path.display(), record.size);
//! }
//! # Ok::<(), dirscout::ScanError>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod progress;
pub mod scanner;

pub use config::{CliArgs, ScanRequest};
pub use error::{Result, ScanError};
pub use filter::FileFilter;
pub use scanner::{FileRecord, ScanEngine, ScanHandle, ScanStats, StatsSnapshot};
