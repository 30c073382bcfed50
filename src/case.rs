//! Benchmark case definitions.

use crate::error::BoxError;
use crate::registry::VariantTable;
use crate::sweep::SweepPoint;
use crate::utils::timer::TimingConfig;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh case fixture from sweep parameters.
pub type ConstructFn<C, P> = Arc<dyn Fn(&P) -> Result<C, BoxError> + Send + Sync>;

/// A named benchmark scenario: fixture construction plus the variants
/// measured against each fixture.
///
/// `C` is the fixture type handed to variants, `P` the parameters of one
/// sweep point.
pub struct BenchmarkCase<C, P = SweepPoint> {
    name: String,
    construct: ConstructFn<C, P>,
    variants: VariantTable<C>,
    repetitions: Option<usize>,
    trials: Option<usize>,
    warmup: Option<usize>,
}

impl<C: 'static, P: 'static> BenchmarkCase<C, P> {
    pub fn new<F>(name: impl Into<String>, construct: F, variants: VariantTable<C>) -> Self
    where
        F: Fn(&P) -> Result<C, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            construct: Arc::new(construct),
            variants,
            repetitions: None,
            trials: None,
            warmup: None,
        }
    }

    /// Override the harness' repetition count for this case.
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    /// Override the harness' trial count for this case.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Override the harness' warm-up count for this case.
    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = Some(warmup);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &VariantTable<C> {
        &self.variants
    }

    /// Build one fresh fixture.
    pub fn construct(&self, params: &P) -> Result<C, BoxError> {
        (self.construct)(params)
    }

    /// `base` with this case's overrides applied.
    pub fn timing(&self, base: &TimingConfig) -> TimingConfig {
        TimingConfig {
            repetitions: self.repetitions.unwrap_or(base.repetitions),
            trials: self.trials.unwrap_or(base.trials),
            warmup: self.warmup.unwrap_or(base.warmup),
            pin_strategy: base.pin_strategy,
        }
    }
}

impl<C, P> fmt::Debug for BenchmarkCase<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkCase")
            .field("name", &self.name)
            .field("variants", &self.variants)
            .field("repetitions", &self.repetitions)
            .field("trials", &self.trials)
            .field("warmup", &self.warmup)
            .finish()
    }
}
