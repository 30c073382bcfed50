//! Statistical summary of one variant's timing samples.

use std::cmp::Ordering;
use std::fmt;

const NANOS_PER_MILLI: f64 = 1e6;

/// Summary over a variant's samples, stored in milliseconds.
///
/// Samples arrive in nanoseconds. Only the mean and standard deviation are
/// scaled, the samples themselves are never rewritten. `std` is the
/// population standard deviation.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantResult {
    label: String,
    n: usize,
    mean: f64,
    std: f64,
}

impl VariantResult {
    /// Summarize nanosecond samples. Returns `None` for an empty sample set.
    pub fn from_nanos(label: impl Into<String>, samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len();
        let mean_ns = samples.iter().map(|&s| s as f64).sum::<f64>() / n as f64;
        let variance = samples
            .iter()
            .map(|&s| {
                let diff = s as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;

        Some(Self {
            label: label.into(),
            n,
            mean: mean_ns / NANOS_PER_MILLI,
            std: variance.sqrt() / NANOS_PER_MILLI,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of samples.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Mean in milliseconds.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Standard deviation in milliseconds.
    pub fn std(&self) -> f64 {
        self.std
    }

    /// Standard error of the mean in milliseconds.
    pub fn se(&self) -> f64 {
        self.std / (self.n as f64).sqrt()
    }

    /// Mean relative to another result (2.0 means twice as slow).
    pub fn relative_to(&self, baseline: &VariantResult) -> f64 {
        self.mean / baseline.mean
    }
}

impl From<&VariantResult> for f64 {
    fn from(result: &VariantResult) -> f64 {
        result.mean
    }
}

impl From<VariantResult> for f64 {
    fn from(result: VariantResult) -> f64 {
        result.mean
    }
}

impl PartialEq<f64> for VariantResult {
    fn eq(&self, other: &f64) -> bool {
        self.mean == *other
    }
}

impl PartialOrd<f64> for VariantResult {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.mean.partial_cmp(other)
    }
}

impl fmt::Display for VariantResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) {:.3} ± {:.3} ms ({} run/s)",
            self.label,
            self.mean,
            self.se(),
            self.n
        )
    }
}
