//! Element-wise product of two `f32` buffers.

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

/// Fixture: two input buffers and a preallocated output.
pub struct MulF32 {
    pub n: usize,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub out: Vec<f32>,
}

impl MulF32 {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            a: random_f32(n, FIXTURE_SEED),
            b: random_f32(n, FIXTURE_SEED + 1),
            out: vec![0.0; n],
        }
    }
}

/// Allocating product, the idiomatic form.
pub fn mul_iter(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

/// In-place product, four lanes per iteration.
pub fn mul_chunked(a: &[f32], b: &[f32], out: &mut [f32]) {
    let mut out_chunks = out.chunks_exact_mut(4);
    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);

    for ((o, x), y) in (&mut out_chunks).zip(&mut a_chunks).zip(&mut b_chunks) {
        o[0] = x[0] * y[0];
        o[1] = x[1] * y[1];
        o[2] = x[2] * y[2];
        o[3] = x[3] * y[3];
    }

    let tail = out_chunks.into_remainder();
    for ((o, x), y) in tail.iter_mut().zip(a_chunks.remainder()).zip(b_chunks.remainder()) {
        *o = x * y;
    }
}

fn construct(point: &SweepPoint) -> Result<MulF32, BoxError> {
    Ok(MulF32::new(length_param("mul_f32", point)?))
}

/// The `mul_f32` case definition.
pub fn case() -> BenchmarkCase<MulF32> {
    let mut variants = VariantRegistry::new()
        .in_process("Rust iter", |c: &mut MulF32| {
            black_box(mul_iter(&c.a, &c.b));
            Ok(())
        })
        .in_process("Rust chunked", |c: &mut MulF32| {
            mul_chunked(&c.a, &c.b, &mut c.out);
            black_box(&c.out);
            Ok(())
        });

    if C_IMPL_AVAILABLE {
        variants = variants.in_process("C scalar", |c: &mut MulF32| {
            c_impl::mul_f32_c(&c.a, &c.b, &mut c.out);
            black_box(&c.out);
            Ok(())
        });
    }

    let variants = variants
        .external("Native bench", "mul_f32", |c: &MulF32| vec![c.n.to_string()])
        .finish();

    BenchmarkCase::new("mul_f32", construct, variants)
}

/// Runner for the `mul_f32` case
pub struct MulF32Suite {
    case: BenchmarkCase<MulF32>,
}

impl MulF32Suite {
    pub fn new() -> Self {
        Self { case: case() }
    }
}

impl Default for MulF32Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite for MulF32Suite {
    fn name(&self) -> &str {
        self.case.name()
    }

    fn description(&self) -> &'static str {
        "Element-wise product of two f32 buffers"
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
