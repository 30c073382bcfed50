//! Catalog of runnable benchmark suites.
//!
//! A suite wraps one [`BenchmarkCase`](crate::case::BenchmarkCase) behind an
//! object-safe interface so the CLI can list, filter and run cases with
//! different fixture types.

use crate::error::HarnessError;
use crate::harness::Harness;
use crate::sweep::{MergedSeries, ResultSet, SweepPoint};

/// Trait that all bundled benchmark suites implement
pub trait Suite: Send + Sync {
    /// Name of the case (e.g., "mul_f32")
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Labels of the case's variants, in execution order
    fn variant_labels(&self) -> Vec<String>;

    /// Sweep used when the caller gives none
    fn default_sweep(&self) -> Vec<SweepPoint>;

    /// Measure the case at one sweep point
    fn run_case(&self, harness: &Harness, point: &SweepPoint) -> Result<ResultSet, HarnessError>;

    /// Measure the case across a sweep
    fn run_sweep(&self, harness: &Harness, sweep: &[SweepPoint]) -> Result<MergedSeries, HarnessError>;
}

/// Registered suites, in registration order.
pub struct SuiteCatalog {
    suites: Vec<Box<dyn Suite>>,
}

impl SuiteCatalog {
    pub fn new() -> Self {
        Self { suites: Vec::new() }
    }

    pub fn register<S: Suite + 'static>(&mut self, suite: S) {
        self.suites.push(Box::new(suite));
    }

    pub fn all(&self) -> &[Box<dyn Suite>] {
        &self.suites
    }

    pub fn find(&self, name: &str) -> Option<&dyn Suite> {
        self.suites
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn list_names(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name()).collect()
    }
}

impl Default for SuiteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Run several suites at the same sweep point, keyed by suite name.
pub fn profile_all(
    harness: &Harness,
    suites: &[&dyn Suite],
    point: &SweepPoint,
) -> Result<Vec<(String, ResultSet)>, HarnessError> {
    suites
        .iter()
        .map(|suite| {
            suite
                .run_case(harness, point)
                .map(|results| (suite.name().to_string(), results))
        })
        .collect()
}

/// Build the catalog of bundled suites
pub fn build_catalog() -> SuiteCatalog {
    let mut catalog = SuiteCatalog::new();

    catalog.register(crate::cases::mul_f32::MulF32Suite::new());
    catalog.register(crate::cases::sum_f32::SumF32Suite::new());
    catalog.register(crate::cases::backwards::BackwardsSuite::new());

    catalog
}
