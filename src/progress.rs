//! Progress reporting for the scan
//!
//! Provides a real-time status line using indicatif, fed by the scan
//! engine's periodic stats snapshots, plus header/summary printing.

use crate::scanner::stats::StatsSnapshot;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays scan status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new spinner-style reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the status line from a stats snapshot
    pub fn update(&self, snapshot: &StatsSnapshot) {
        let mode = if snapshot.sequential_mode {
            "sequential"
        } else {
            "parallel"
        };

        let msg = format!(
            "Dirs: {} | Matched: {} | Rate: {:.0}/s | Queue: {} | Active: {} | Errors: {} | Mode: {}",
            format_number(snapshot.dirs_processed),
            format_number(snapshot.files_matched),
            snapshot.dirs_per_sec,
            snapshot.frontier_len,
            snapshot.active_workers,
            snapshot.errors,
            mode,
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the scan results
pub fn print_summary(snapshot: &StatsSnapshot, records_written: u64, output: &str) {
    let duration_secs = snapshot.elapsed.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        snapshot.dirs_processed as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Scan Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(snapshot.dirs_processed)
    );
    if snapshot.deep_dirs > 0 {
        println!(
            "  {} {}",
            style("Sequential:").bold(),
            format_number(snapshot.deep_dirs)
        );
    }
    println!(
        "  {} {}",
        style("Matched:").bold(),
        format_number(snapshot.files_matched)
    );
    println!(
        "  {} {:.1}s ({:.0} dirs/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if snapshot.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(snapshot.errors)
        );
    }
    println!(
        "  {} {} ({} records)",
        style("Output:").bold(),
        output,
        format_number(records_written)
    );
    println!();
}

/// Print a header at the start of the scan
pub fn print_header(root: &str, workers: usize, memory_ceiling: u64, output: &str) {
    println!();
    println!(
        "{} {}",
        style("dirscout").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!(
        "  {} {}",
        style("Memory limit:").bold(),
        format_size(memory_ceiling, BINARY)
    );
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}
