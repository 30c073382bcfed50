//! Command line runner for the bundled benchmark cases.
//!
//! Usage:
//!   perfsuite                      # Run every case over its default sweep
//!   perfsuite --list               # List available cases
//!   perfsuite mul_f32 --sizes 1024,4096
//!   perfsuite --csv results        # Write results/<case>.csv per case
//!   perfsuite sum_f32 --normalize "Rust iter"

use clap::Parser;
use perfsuite::catalog::{build_catalog, Suite};
use perfsuite::external::{ArgEncoding, CargoBenchResolver, ExternalConfig, ExternalRunner};
use perfsuite::utils::export::export_series_csv;
use perfsuite::utils::{PinStrategy, TimingConfig};
use perfsuite::{tui, Harness, HarnessError, SweepPoint};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Compare implementation variants of the same operation
#[derive(Parser)]
#[command(name = "perfsuite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run only this case
    case: Option<String>,

    /// List available cases and exit
    #[arg(short, long)]
    list: bool,

    /// Comma-separated input sizes, replacing the default sweep of sized cases
    #[arg(long, value_delimiter = ',')]
    sizes: Vec<usize>,

    /// Fresh fixtures per case run
    #[arg(short, long, default_value_t = perfsuite::utils::timer::DEFAULT_REPETITIONS)]
    repetitions: usize,

    /// Timed calls per in-process variant and repetition
    #[arg(short, long, default_value_t = perfsuite::utils::timer::DEFAULT_TRIALS)]
    trials: usize,

    /// Untimed calls before the timed ones
    #[arg(short, long, default_value_t = perfsuite::utils::timer::DEFAULT_WARMUP)]
    warmup: usize,

    /// Directory receiving one CSV file per case
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Pass each argument to native executables separately instead of concatenated
    #[arg(long)]
    separate_args: bool,

    /// Kill native executables running longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Do not pin the measuring thread to a CPU core
    #[arg(long)]
    no_pin: bool,

    /// Report the last sweep point relative to this variant instead of the first one
    #[arg(long, value_name = "LABEL")]
    normalize: Option<String>,

    /// Build native bench targets from this Cargo.toml instead of the current package
    #[arg(long)]
    manifest_path: Option<PathBuf>,
}

impl Cli {
    fn harness(&self) -> Harness {
        let config = TimingConfig {
            repetitions: self.repetitions,
            trials: self.trials,
            warmup: self.warmup,
            pin_strategy: if self.no_pin {
                PinStrategy::Disabled
            } else {
                PinStrategy::Global
            },
        };

        let mut resolver = CargoBenchResolver::new();
        if let Some(manifest) = &self.manifest_path {
            resolver = resolver.with_manifest(manifest);
        }

        let external = ExternalRunner::new(resolver).with_config(ExternalConfig {
            encoding: if self.separate_args {
                ArgEncoding::Separate
            } else {
                ArgEncoding::Concatenated
            },
            timeout: self.timeout_ms.map(Duration::from_millis),
        });

        Harness::new(config).with_external(external)
    }

    fn sweep_for(&self, suite: &dyn Suite) -> Vec<SweepPoint> {
        let default = suite.default_sweep();
        let sized = matches!(default.first(), Some(SweepPoint::Value(_)));
        if sized && !self.sizes.is_empty() {
            self.sizes.iter().map(|&n| SweepPoint::from(n)).collect()
        } else {
            default
        }
    }
}

fn run_suite(cli: &Cli, harness: &Harness, suite: &dyn Suite) -> Result<(), HarnessError> {
    tui::print_suite_info_box(suite);

    let sweep = cli.sweep_for(suite);
    let series = suite.run_sweep(harness, &sweep)?;
    tui::print_series(&sweep, &series);

    let last = series.points().checked_sub(1);
    if let (Some(index), Some(point)) = (last, sweep.last()) {
        let title = format!("{} @ {}", suite.name(), point);
        match cli.normalize.as_deref() {
            Some(baseline) => match series.normalized(baseline, index) {
                Some(ratios) => tui::print_normalized(&title, baseline, &ratios),
                None => log::warn!("{} has no variant '{}' to normalize by", suite.name(), baseline),
            },
            None => {
                if let Some(results) = series.at(index) {
                    tui::print_case_results(&title, &results);
                }
            }
        }
    }

    if let Some(dir) = &cli.csv {
        let path = dir.join(format!("{}.csv", suite.name()));
        let written = std::fs::create_dir_all(dir)
            .and_then(|_| export_series_csv(&path.to_string_lossy(), suite.name(), &sweep, &series));
        match written {
            Ok(()) => log::info!("wrote {}", path.display()),
            Err(e) => log::error!("failed to write {}: {}", path.display(), e),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let catalog = build_catalog();

    if cli.list {
        tui::print_available_suites(&catalog);
        return ExitCode::SUCCESS;
    }

    let suites: Vec<&dyn Suite> = match &cli.case {
        Some(name) => match catalog.find(name) {
            Some(suite) => vec![suite],
            None => {
                eprintln!("Case '{}' not found.", name);
                eprintln!("Available: {:?}", catalog.list_names());
                return ExitCode::FAILURE;
            }
        },
        None => catalog.all().iter().map(|s| s.as_ref()).collect(),
    };

    tui::print_header();
    let harness = cli.harness();
    log::info!(
        "timing with {}: {} repetition(s) x {} trial(s), {} warm-up",
        harness.clock().name(),
        harness.config().repetitions,
        harness.config().trials,
        harness.config().warmup
    );

    for suite in suites {
        if let Err(e) = run_suite(&cli, &harness, suite) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    println!("Note: relative speed is measured against the first variant.");
    ExitCode::SUCCESS
}
