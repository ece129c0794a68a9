//! Error types for dirscout
//!
//! This module defines the error hierarchy for the scan engine:
//! - Fatal errors (missing root) that abort before any worker starts
//! - Configuration and CLI validation errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Recoverable filesystem errors never surface here - they are
//!   absorbed into the scan's error counter and the scan continues

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the dirscout library
#[derive(Error, Debug)]
pub enum ScanError {
    /// Root path does not exist - fatal, checked before any worker starts
    #[error("Root path not found: '{path}'")]
    RootNotFound { path: PathBuf },

    /// Root path exists but is not a directory
    #[error("Root path is not a directory: '{path}'")]
    RootNotDirectory { path: PathBuf },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (export file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid result buffer capacity
    #[error("Invalid result buffer size {size}: must be at least {min}")]
    InvalidResultBuffer { size: usize, min: usize },

    /// Invalid frontier size cap
    #[error("Invalid max queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid memory ceiling
    #[error("Invalid memory limit {bytes} bytes: must be at least {min} bytes")]
    InvalidMemoryCeiling { bytes: u64, min: u64 },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker panicked outside a task boundary
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },
}

/// Result type alias for ScanError
pub type Result<T> = std::result::Result<T, ScanError>;

/// Outcome of expanding a single directory task
#[derive(Debug)]
pub enum ExpandOutcome {
    /// Directory listed successfully
    Success {
        path: PathBuf,
        /// Files that matched the filter and were emitted
        matched: usize,
        /// Subdirectories discovered
        subdirs: usize,
    },

    /// Directory could not be listed (permission denied, I/O error)
    Skipped { path: PathBuf, reason: String },

    /// Expansion aborted because the scan was cancelled
    Cancelled,
}

impl ExpandOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, ExpandOutcome::Success { .. })
    }
}
