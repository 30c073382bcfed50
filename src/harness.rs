//! Measurement protocol for cases and sweeps.
//!
//! A case run performs `repetitions` rounds. Each round builds a fresh
//! fixture and walks the case's variants in registration order:
//! - in-process variants get `warmup` untimed calls, then `trials` timed calls
//! - external variants are invoked once and report their own time
//!
//! Executables of external variants are resolved once, before the first
//! repetition.
//!
//! Everything runs sequentially on the calling thread.

use crate::case::BenchmarkCase;
use crate::error::HarnessError;
use crate::external::ExternalRunner;
use crate::registry::Variant;
use crate::result::VariantResult;
use crate::runner::VariantRunner;
use crate::sweep::{MergedSeries, ResultSet};
use crate::utils::cpu_affinity::CpuPinGuard;
use crate::utils::timer::{Clock, PinStrategy, TimingConfig};
use std::fmt;

/// Runs cases and sweeps with one clock and one external runner.
pub struct Harness {
    config: TimingConfig,
    clock: Clock,
    external: ExternalRunner,
}

impl Harness {
    /// Harness with the platform's preferred clock and a cargo-backed
    /// external runner sharing the process-wide executable cache.
    pub fn new(config: TimingConfig) -> Self {
        let clock = Clock::detect();
        log::debug!("timing in-process variants with {}", clock.name());
        Self {
            config,
            clock,
            external: ExternalRunner::default(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_external(mut self, external: ExternalRunner) -> Self {
        self.external = external;
        self
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Measure every variant of `case` for one parameter set.
    ///
    /// Any failure aborts the whole case; no partial results are returned.
    pub fn run_case<C, P>(&self, case: &BenchmarkCase<C, P>, params: &P) -> Result<ResultSet, HarnessError>
    where
        C: 'static,
        P: 'static,
    {
        let config = case.timing(&self.config);
        config.validate().map_err(HarnessError::Config)?;

        let table = case.variants();
        let runner = VariantRunner::new(self.clock, &self.external);
        let mut samples: Vec<Vec<u64>> = table
            .iter()
            .map(|entry| {
                let per_rep = if entry.variant.is_external() { 1 } else { config.trials };
                Vec::with_capacity(per_rep * config.repetitions)
            })
            .collect();

        log::info!(
            "{}: {} variant(s), {} repetition(s) x {} trial(s), {} warm-up",
            case.name(),
            table.len(),
            config.repetitions,
            config.trials,
            config.warmup
        );

        // Native targets are built before any pinning or timing
        let executables = table
            .iter()
            .map(|entry| runner.resolve(case.name(), entry))
            .collect::<Result<Vec<_>, _>>()?;

        let _global_pin = (config.pin_strategy == PinStrategy::Global).then(CpuPinGuard::new);

        for _ in 0..config.repetitions {
            let mut instance = case
                .construct(params)
                .map_err(|source| HarnessError::Construction {
                    case: case.name().to_string(),
                    source,
                })?;

            for ((entry, executable), collected) in table.iter().zip(&executables).zip(samples.iter_mut()) {
                match &entry.variant {
                    Variant::External { .. } => {
                        collected.push(runner.sample(case.name(), entry, executable.as_deref(), &mut instance)?);
                    }
                    Variant::InProcess(_) => {
                        for _ in 0..config.warmup {
                            runner.warm_up(case.name(), entry, &mut instance)?;
                        }
                        for _ in 0..config.trials {
                            let _per_exec_pin =
                                (config.pin_strategy == PinStrategy::PerExecution).then(CpuPinGuard::new);
                            collected.push(runner.sample(case.name(), entry, None, &mut instance)?);
                        }
                    }
                }
            }
        }

        let results: Vec<VariantResult> = table
            .iter()
            .zip(samples)
            .filter_map(|(entry, collected)| VariantResult::from_nanos(entry.label.clone(), &collected))
            .collect();

        for result in &results {
            log::debug!("{}: {}", case.name(), result);
        }

        Ok(ResultSet::new(results))
    }

    /// Run `case` once per sweep point, in order, and merge the results.
    ///
    /// The first failing point aborts the sweep; the error names its index.
    pub fn run_sweep<C, P>(&self, case: &BenchmarkCase<C, P>, sweep: &[P]) -> Result<MergedSeries, HarnessError>
    where
        C: 'static,
        P: fmt::Display + 'static,
    {
        let mut points = Vec::with_capacity(sweep.len());

        for (index, params) in sweep.iter().enumerate() {
            log::info!("{} [{}/{}] {}", case.name(), index + 1, sweep.len(), params);
            let results = self
                .run_case(case, params)
                .map_err(|source| HarnessError::SweepPoint {
                    index,
                    source: Box::new(source),
                })?;
            points.push(results);
        }

        Ok(MergedSeries::merge(points))
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}
