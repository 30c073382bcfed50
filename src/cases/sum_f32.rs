//! Sum of an `f32` buffer.

use super::c_impl::{self, C_IMPL_AVAILABLE};
use super::{length_param, power_of_two_sweep};
use crate::case::BenchmarkCase;
use crate::catalog::Suite;
use crate::error::{BoxError, HarnessError};
use crate::harness::Harness;
use crate::registry::VariantRegistry;
use crate::sweep::{MergedSeries, ResultSet, SweepPoint};
use crate::utils::bench::{random_f32, FIXTURE_SEED};
use std::hint::black_box;

pub struct SumF32 {
    pub n: usize,
    pub data: Vec<f32>,
}

pub fn sum_iter(data: &[f32]) -> f32 {
    data.iter().sum()
}

/// Sum with four independent accumulators.
pub fn sum_unrolled(data: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let chunks = data.chunks_exact(4);
    let tail = chunks.remainder();

    for chunk in chunks {
        acc[0] += chunk[0];
        acc[1] += chunk[1];
        acc[2] += chunk[2];
        acc[3] += chunk[3];
    }

    let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
    for v in tail {
        sum += v;
    }
    sum
}

fn construct(point: &SweepPoint) -> Result<SumF32, BoxError> {
    let n = length_param("sum_f32", point)?;
    Ok(SumF32 {
        n,
        data: random_f32(n, FIXTURE_SEED),
    })
}

/// The `sum_f32` case definition.
pub fn case() -> BenchmarkCase<SumF32> {
    let mut variants = VariantRegistry::new()
        .in_process("Rust iter", |c: &mut SumF32| {
            black_box(sum_iter(&c.data));
            Ok(())
        })
        .in_process("Rust unrolled", |c: &mut SumF32| {
            black_box(sum_unrolled(&c.data));
            Ok(())
        });

    if C_IMPL_AVAILABLE {
        variants = variants.in_process("C scalar", |c: &mut SumF32| {
            black_box(c_impl::sum_f32_c(&c.data));
            Ok(())
        });
    }

    let variants = variants
        .external("Native bench", "sum_f32", |c: &SumF32| vec![c.n.to_string()])
        .finish();

    BenchmarkCase::new("sum_f32", construct, variants)
}

/// Runner for the `sum_f32` case
pub struct SumF32Suite {
    case: BenchmarkCase<SumF32>,
}

impl SumF32Suite {
    pub fn new() -> Self {
        Self { case: case() }
    }
}

impl Default for SumF32Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite for SumF32Suite {
    fn name(&self) -> &str {
        self.case.name()
    }

    fn description(&self) -> &'static str {
        "Sum of all elements of an f32 buffer"
    }

    fn variant_labels(&self) -> Vec<String> {
        self.case.variants().labels().into_iter().map(String::from).collect()
    }

    fn default_sweep(&self) -> Vec<SweepPoint> {
        power_of_two_sweep(9, 21, 2)
    }

    fn run_case(&self, harness: &Harness, point: &SweepPoint) -> Result<ResultSet, HarnessError> {
        harness.run_case(&self.case, point)
    }

    fn run_sweep(&self, harness: &Harness, sweep: &[SweepPoint]) -> Result<MergedSeries, HarnessError> {
        harness.run_sweep(&self.case, sweep)
    }
}
