//! Concurrent breadth-first directory scanner
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │       ScanEngine         │
//!                  │  seeds frontier, spawns  │
//!                  │  workers + stats monitor │
//!                  └────────────┬─────────────┘
//!                               │
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!  ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//!  │  Worker 1 │          │  Worker 2 │   ...    │  Worker N │
//!  └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!        │   pop dirs / push discovered subdirs        │
//!        └──────────────────────┼──────────────────────┘
//!                               │
//!                  ┌────────────▼─────────────┐
//!                  │        Frontier          │
//!                  │  (crossbeam MPMC queue)  │
//!                  │  circuit breaker: queue  │
//!                  │  depth / memory ceiling  │
//!                  └──────────────────────────┘
//!
//!  matched records:  workers ──bounded channel──▶ ScanHandle iterator
//! ```
//!
//! Workers drain the frontier breadth-first. Under queue-depth or
//! memory pressure the breaker flips a one-way mode flag and every
//! subsequently discovered directory is expanded inline, depth-first,
//! by the discovering worker - trading parallelism for bounded memory.
//! Termination is the quiescence condition: no active worker and an
//! empty frontier, confirmed by a delayed re-check.

pub mod channel;
pub mod engine;
pub mod frontier;
pub mod record;
pub mod stats;
pub mod worker;

pub use engine::{ScanEngine, ScanHandle};
pub use frontier::{Frontier, Routed};
pub use record::{DirectoryTask, FileRecord};
pub use stats::{ProgressCallback, ScanStats, StatsMonitor, StatsSnapshot};
pub use worker::Worker;
