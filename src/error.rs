//! Error types for the measurement harness.
//!
//! Every failure is surfaced to the caller; none is turned into a missing
//! data point.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Error type returned by user-supplied fixture constructors and variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while running a case or a sweep.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The case fixture could not be constructed.
    #[error("case '{case}': fixture construction failed: {source}")]
    Construction {
        case: String,
        #[source]
        source: BoxError,
    },

    /// An in-process variant failed during warm-up or timed execution.
    #[error("case '{case}', variant '{label}': execution failed: {source}")]
    VariantExecution {
        case: String,
        label: String,
        #[source]
        source: BoxError,
    },

    /// An external variant's process failed or reported garbage.
    #[error("case '{case}', variant '{label}': {source}")]
    ExternalProcess {
        case: String,
        label: String,
        #[source]
        source: ExternalProcessError,
    },

    /// The executable for an external variant could not be resolved.
    #[error("case '{case}', variant '{label}': {source}")]
    BuildResolution {
        case: String,
        label: String,
        #[source]
        source: BuildResolutionError,
    },

    /// A sweep point failed; the whole sweep is aborted.
    #[error("sweep point {index} failed: {source}")]
    SweepPoint {
        index: usize,
        #[source]
        source: Box<HarnessError>,
    },

    /// Timing configuration is unusable (zero repetitions or trials).
    #[error("invalid timing configuration: {0}")]
    Config(String),
}

impl HarnessError {
    /// Name of the case the error was raised in, if any.
    pub fn case(&self) -> Option<&str> {
        match self {
            HarnessError::Construction { case, .. }
            | HarnessError::VariantExecution { case, .. }
            | HarnessError::ExternalProcess { case, .. }
            | HarnessError::BuildResolution { case, .. } => Some(case),
            HarnessError::SweepPoint { source, .. } => source.case(),
            HarnessError::Config(_) => None,
        }
    }

    /// Label of the failing variant, if the failure belongs to one.
    pub fn label(&self) -> Option<&str> {
        match self {
            HarnessError::VariantExecution { label, .. }
            | HarnessError::ExternalProcess { label, .. }
            | HarnessError::BuildResolution { label, .. } => Some(label),
            HarnessError::SweepPoint { source, .. } => source.label(),
            HarnessError::Construction { .. } | HarnessError::Config(_) => None,
        }
    }

    /// Strip sweep wrapping and return the error raised by the case run.
    pub fn root(&self) -> &HarnessError {
        match self {
            HarnessError::SweepPoint { source, .. } => source.root(),
            other => other,
        }
    }
}

/// The time source could not be read.
#[derive(Debug, Error)]
#[error("failed to read the {clock}")]
pub struct ClockError {
    pub clock: &'static str,
}

/// Failure of an external variant's subprocess.
#[derive(Debug, Error)]
pub enum ExternalProcessError {
    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {}: {stderr}", .path.display(), describe_status(.code))]
    NonZeroExit {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{} printed {output:?}, expected elapsed nanoseconds", .path.display())]
    UnparseableOutput { path: PathBuf, output: String },

    #[error("{} did not finish within {timeout:?}", .path.display())]
    TimedOut { path: PathBuf, timeout: Duration },
}

fn describe_status(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Failure to turn a build target into a runnable executable.
#[derive(Debug, Error)]
pub enum BuildResolutionError {
    #[error("failed to start build for target '{target}': {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build for target '{target}' failed: {stderr}")]
    BuildFailed { target: String, stderr: String },

    #[error("build output for target '{target}' has no executable path")]
    MissingArtifact { target: String },

    #[error("build output for target '{target}' is not valid JSON: {source}")]
    MalformedEvent {
        target: String,
        #[source]
        source: serde_json::Error,
    },
}
