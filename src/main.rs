//! dirscout - Parallel File Finder
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use dirscout::config::{CliArgs, ScanRequest};
use dirscout::export::CsvExporter;
use dirscout::progress::{print_header, print_summary, ProgressReporter};
use dirscout::scanner::ScanEngine;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let request = ScanRequest::from_args(&args).context("Invalid configuration")?;

    if !args.quiet {
        print_header(
            &request.root.display().to_string(),
            request.workers,
            request.memory_ceiling,
            &args.output.display().to_string(),
        );
    }

    let mut engine = ScanEngine::new(request.clone());

    // Progress reporter fed by the engine's 1-second snapshots
    let reporter = if args.quiet {
        None
    } else {
        let reporter = Arc::new(ProgressReporter::new());
        reporter.set_status("Scanning...");
        let callback_reporter = Arc::clone(&reporter);
        engine = engine.on_progress(Box::new(move |snapshot| {
            callback_reporter.update(snapshot);
        }));
        Some(reporter)
    };

    // Graceful shutdown on Ctrl-C
    let cancel = engine.cancel_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        cancel.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let mut handle = engine.start().context("Scan failed to start")?;

    // The exporter is the sole consumer; a slow disk here throttles
    // the scan through the result channel, which is intended
    let mut exporter =
        CsvExporter::create(&args.output).context("Failed to create output file")?;
    for record in handle.by_ref() {
        exporter
            .write_record(&record)
            .context("Failed to write record")?;
    }
    let written = exporter.finish().context("Failed to finalize output")?;

    let snapshot = handle.snapshot();
    if let Some(ref reporter) = reporter {
        reporter.finish("Scan complete");
    }

    if !args.quiet {
        print_summary(&snapshot, written, &args.output.display().to_string());
    }

    if snapshot.errors > 0 {
        info!(
            errors = snapshot.errors,
            "Scan completed with recoverable errors"
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dirscout={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
