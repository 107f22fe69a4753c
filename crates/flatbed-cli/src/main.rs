// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flatbed — turn photographed documents into flat, scan-like pages.
//
// Entry point. Parses arguments, initialises logging, builds the scan
// configuration, and processes every input photo in parallel.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flatbed_core::human_errors::{HumanError, humanize_error};
use flatbed_core::{FlatbedError, ScanConfig};
use flatbed_document::{Scanner, process_batch};

#[derive(Debug, Parser)]
#[command(name = "flatbed")]
#[command(about = "Flatten photographed documents into scan-like pages")]
#[command(version)]
struct Cli {
    /// Photos to scan
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Directory for scanned pages (created if missing)
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// JSON scan configuration; missing fields take defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the edge map, outline overlay, and flattened colour page
    #[arg(long)]
    debug: bool,

    /// Height in pixels used for edge and outline detection
    #[arg(long, value_name = "PX", conflicts_with = "no_downscale")]
    working_height: Option<u32>,

    /// Detect on the full-resolution photo
    #[arg(long)]
    no_downscale: bool,

    /// Number of photos processed at once
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn scan_config(&self) -> Result<ScanConfig, FlatbedError> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_json_file(path)?,
            None => ScanConfig::default(),
        };
        if self.debug {
            config.debug = true;
        }
        if self.no_downscale {
            config.working_height = None;
        } else if let Some(height) = self.working_height {
            config.working_height = Some(height);
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Two-line report of a failure, tagged with its severity.
fn describe_failure(subject: &str, human: &HumanError) -> String {
    format!(
        "{subject}: [{}] {}\n  {}",
        human.severity.label(),
        human.message,
        human.suggestion
    )
}

fn report_setup_error(err: &FlatbedError) -> ExitCode {
    eprintln!("{}", describe_failure("flatbed", &humanize_error(err)));
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let scanner = match cli.scan_config().and_then(Scanner::new) {
        Ok(scanner) => scanner,
        Err(err) => return report_setup_error(&err),
    };

    if let Err(err) = std::fs::create_dir_all(&cli.out_dir) {
        return report_setup_error(&FlatbedError::Io(err));
    }

    let results = match cli.jobs {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| process_batch(&cli.images, &cli.out_dir, &scanner)),
            Err(err) => {
                return report_setup_error(&FlatbedError::InvalidConfig(format!(
                    "cannot start {jobs} worker threads: {err}"
                )));
            }
        },
        None => process_batch(&cli.images, &cli.out_dir, &scanner),
    };

    let mut failures = 0usize;
    for item in &results {
        match &item.result {
            Ok(output) => println!("{} -> {}", item.input.display(), output.display()),
            Err(err) => {
                failures += 1;
                let subject = item.input.display().to_string();
                println!("{}", describe_failure(&subject, &humanize_error(err)));
            }
        }
    }

    tracing::info!(
        scanned = results.len() - failures,
        failed = failures,
        "Batch finished"
    );

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
