//! Manual gradient computation for `(a * b) / (c + 1)`.
//!
//! The base case only knows the ID of the native workload; the arithmetic
//! case embeds it and inherits the native variant, adding its own Rust one.

use crate::case::BenchmarkCase;
use crate::catalog::Suite;
use crate::error::{BoxError, HarnessError};
use crate::harness::Harness;
use crate::registry::{VariantRegistry, VariantTable};
use crate::sweep::{MergedSeries, ResultSet, SweepPoint};
use crate::utils::bench::{random_f32, random_signed_f32, FIXTURE_SEED};
use std::hint::black_box;

/// Buffer length of the arithmetic workload.
pub const ARITHMETIC_LEN: usize = 1000;
/// Forward/backward passes per invocation.
pub const PASSES: usize = 1000;

/// Identifies which workload the native executable runs.
pub struct BackwardsId {
    pub id: u32,
}

/// Variants shared by every backwards case.
pub fn base_variants() -> VariantTable<BackwardsId> {
    VariantRegistry::new()
        .external("Native bench", "backwards", |c: &BackwardsId| vec![c.id.to_string()])
        .finish()
}

/// Inputs and accumulated gradients of the arithmetic workload.
pub struct ArithmeticBackwards {
    pub base: BackwardsId,
    pub a: Vec<f32>,
    pub b: Vec<f32>,
    pub c: Vec<f32>,
    pub grad_a: Vec<f32>,
    pub grad_b: Vec<f32>,
    pub grad_c: Vec<f32>,
}

impl ArithmeticBackwards {
    pub const ID: u32 = 0;

    pub fn new(n: usize) -> Self {
        Self {
            base: BackwardsId { id: Self::ID },
            a: random_signed_f32(n, FIXTURE_SEED),
            b: random_signed_f32(n, FIXTURE_SEED + 1),
            // Non-negative so that `c + 1` never vanishes
            c: random_f32(n, FIXTURE_SEED + 2),
            grad_a: vec![0.0; n],
            grad_b: vec![0.0; n],
            grad_c: vec![0.0; n],
        }
    }

    /// One forward pass, accumulating gradients with a unit upstream gradient.
    pub fn backward(&mut self) -> f32 {
        let mut total = 0.0;
        for i in 0..self.a.len() {
            let denom = self.c[i] + 1.0;
            let r = (self.a[i] * self.b[i]) / denom;
            self.grad_a[i] += self.b[i] / denom;
            self.grad_b[i] += self.a[i] / denom;
            self.grad_c[i] -= r / denom;
            total += r;
        }
        total
    }

    pub fn zero_grad(&mut self) {
        self.grad_a.fill(0.0);
        self.grad_b.fill(0.0);
        self.grad_c.fill(0.0);
    }
}

impl AsRef<BackwardsId> for ArithmeticBackwards {
    fn as_ref(&self) -> &BackwardsId {
        &self.base
    }
}

impl AsMut<BackwardsId> for ArithmeticBackwards {
    fn as_mut(&mut self) -> &mut BackwardsId {
        &mut self.base
    }
}

/// Run the arithmetic workload the way every variant does: `PASSES`
/// forward/backward passes, zeroing gradients in between.
pub fn run_arithmetic(fixture: &mut ArithmeticBackwards) -> f32 {
    let mut last = 0.0;
    for _ in 0..PASSES {
        last = fixture.backward();
        fixture.zero_grad();
    }
    last
}

/// The "Arithmetic Backwards" case definition.
pub fn case() -> BenchmarkCase<ArithmeticBackwards> {
    let variants = VariantRegistry::<ArithmeticBackwards>::new()
        .inherit_via(&base_variants())
        .in_process("Rust manual grad", |c: &mut ArithmeticBackwards| {
            black_box(run_arithmetic(c));
            Ok(())
        })
        .finish();

    BenchmarkCase::new(
        "Arithmetic Backwards",
        |_: &SweepPoint| -> Result<ArithmeticBackwards, BoxError> { Ok(ArithmeticBackwards::new(ARITHMETIC_LEN)) },
        variants,
    )
}

/// Runner for the backwards cases
pub struct BackwardsSuite {
    case: BenchmarkCase<ArithmeticBackwards>,
}

impl BackwardsSuite {
    pub fn new() -> Self {
        Self { case: case() }
    }
}

impl Default for BackwardsSuite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite for BackwardsSuite {
    fn name(&self) -> &str {
        "backwards"
    }

    fn description(&self) -> &'static str {
        "Forward and backward pass of (a * b) / (c + 1)"
    }

    fn variant_labels(&self) -> Vec<String> {
        self.case.variants().labels().into_iter().map(String::from).collect()
    }

    fn default_sweep(&self) -> Vec<SweepPoint> {
        vec![SweepPoint::Sequence(Vec::new())]
    }

    fn run_case(&self, harness: &Harness, point: &SweepPoint) -> Result<ResultSet, HarnessError> {
        harness.run_case(&self.case, point)
    }

    fn run_sweep(&self, harness: &Harness, sweep: &[SweepPoint]) -> Result<MergedSeries, HarnessError> {
        harness.run_sweep(&self.case, sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherits_native_variant() {
        let case = case();
        assert_eq!(case.variants().labels(), vec!["Native bench", "Rust manual grad"]);
        assert_eq!(
            case.variants().get("Native bench").and_then(|v| v.target()),
            Some("backwards")
        );
    }

    #[test]
    fn test_gradients() {
        let mut fixture = ArithmeticBackwards {
            base: BackwardsId { id: 0 },
            a: vec![2.0],
            b: vec![3.0],
            c: vec![1.0],
            grad_a: vec![0.0],
            grad_b: vec![0.0],
            grad_c: vec![0.0],
        };

        let r = fixture.backward();
        assert_eq!(r, 3.0);
        assert_eq!(fixture.grad_a, vec![1.5]);
        assert_eq!(fixture.grad_b, vec![1.0]);
        assert_eq!(fixture.grad_c, vec![-1.5]);

        fixture.backward();
        assert_eq!(fixture.grad_a, vec![3.0]);

        fixture.zero_grad();
        assert_eq!(fixture.grad_c, vec![0.0]);
    }
}
