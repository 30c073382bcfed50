//! End-to-end checks of the measurement protocol through the public API.

use perfsuite::catalog::{profile_all, Suite};
use perfsuite::cases::mul_f32::{mul_chunked, MulF32};
use perfsuite::external::{ExecutableCache, PrebuiltResolver};
use perfsuite::prelude::*;
use perfsuite::{ExternalRunner, ParamValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config(repetitions: usize, trials: usize, warmup: usize) -> TimingConfig {
    TimingConfig {
        repetitions,
        trials,
        warmup,
        pin_strategy: PinStrategy::Disabled,
    }
}

fn harness_with(config: TimingConfig, resolver: PrebuiltResolver) -> Harness {
    let external = ExternalRunner::new(resolver).with_cache(Arc::new(ExecutableCache::new()));
    Harness::new(config).with_clock(Clock::wall()).with_external(external)
}

fn harness(repetitions: usize, trials: usize, warmup: usize) -> Harness {
    harness_with(config(repetitions, trials, warmup), PrebuiltResolver::new())
}

fn counting(counter: &Arc<AtomicUsize>) -> impl Fn(&mut ()) -> Result<(), BoxError> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_: &mut ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn warmup_calls_are_not_sampled() {
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));

    let case = BenchmarkCase::new(
        "counting",
        |_: &()| Ok(()),
        VariantRegistry::new()
            .in_process("A", counting(&a))
            .in_process("B", counting(&b))
            .finish(),
    );

    let results = harness(1, 5, 2).run_case(&case, &()).unwrap();

    assert_eq!(a.load(Ordering::SeqCst), 7);
    assert_eq!(b.load(Ordering::SeqCst), 7);
    assert_eq!(results.get("A").unwrap().n(), 5);
    assert_eq!(results.get("B").unwrap().n(), 5);
}

#[test]
fn sweep_series_are_index_aligned() {
    let case = BenchmarkCase::new(
        "sized",
        |n: &usize| Ok(vec![1u64; *n]),
        VariantRegistry::new()
            .in_process("A", |v: &mut Vec<u64>| {
                std::hint::black_box(v.iter().sum::<u64>());
                Ok(())
            })
            .in_process("B", |v: &mut Vec<u64>| {
                std::hint::black_box(v.iter().max());
                Ok(())
            })
            .finish(),
    );

    let sweep = [16usize, 256, 4096];
    let series = harness(2, 3, 0).run_sweep(&case, &sweep).unwrap();

    assert_eq!(series.labels(), vec!["A", "B"]);
    assert_eq!(series.points(), sweep.len());
    for (_, results) in series.iter() {
        assert_eq!(results.len(), sweep.len());
        assert!(results.iter().all(|r| r.n() == 6));
    }
}

#[test]
fn repeated_runs_are_consistent() {
    let case = BenchmarkCase::new(
        "deterministic",
        |n: &usize| Ok(MulF32::new(*n)),
        VariantRegistry::new()
            .in_process("Rust chunked", |f: &mut MulF32| {
                mul_chunked(&f.a, &f.b, &mut f.out);
                Ok(())
            })
            .finish(),
    );

    let harness = harness(3, 4, 1);
    let first = harness.run_sweep(&case, &[64, 128]).unwrap();
    let second = harness.run_sweep(&case, &[64, 128]).unwrap();

    assert_eq!(first.labels(), second.labels());
    for ((_, a), (_, b)) in first.iter().zip(second.iter()) {
        let n_a: Vec<usize> = a.iter().map(|r| r.n()).collect();
        let n_b: Vec<usize> = b.iter().map(|r| r.n()).collect();
        assert_eq!(n_a, n_b);
        assert!(a.iter().chain(b).all(|r| r.mean().is_finite() && *r >= 0.0));
    }
}

#[test]
fn element_wise_product_is_measured() {
    let case = BenchmarkCase::new(
        "mul",
        |n: &usize| Ok(MulF32::new(*n)),
        VariantRegistry::new()
            .in_process("product", |f: &mut MulF32| {
                mul_chunked(&f.a, &f.b, &mut f.out);
                Ok(())
            })
            .finish(),
    )
    .with_repetitions(1)
    .with_trials(20)
    .with_warmup(0);

    let results = harness(10, 1, 1).run_case(&case, &1000).unwrap();
    let product = results.get("product").unwrap();

    assert_eq!(product.n(), 20);
    assert!(*product > 0.0);
}

#[test]
fn inherited_variants_can_be_overridden() {
    let base_x = Arc::new(AtomicUsize::new(0));
    let child_x = Arc::new(AtomicUsize::new(0));
    let child_y = Arc::new(AtomicUsize::new(0));

    let base = VariantRegistry::new().in_process("X", counting(&base_x)).finish();

    let extended = VariantRegistry::new()
        .inherit(&base)
        .in_process("Y", counting(&child_y))
        .finish();
    let case = BenchmarkCase::new("child", |_: &()| Ok(()), extended);
    let results = harness(1, 1, 0).run_case(&case, &()).unwrap();
    assert_eq!(results.labels(), vec!["X", "Y"]);
    assert_eq!(base_x.load(Ordering::SeqCst), 1);
    assert_eq!(child_y.load(Ordering::SeqCst), 1);

    let overridden = VariantRegistry::new()
        .inherit(&base)
        .in_process("Y", counting(&child_y))
        .in_process("X", counting(&child_x))
        .finish();
    let case = BenchmarkCase::new("child", |_: &()| Ok(()), overridden);
    let results = harness(1, 1, 0).run_case(&case, &()).unwrap();
    assert_eq!(results.labels(), vec!["X", "Y"]);
    assert_eq!(base_x.load(Ordering::SeqCst), 1);
    assert_eq!(child_x.load(Ordering::SeqCst), 1);
}

#[test]
fn failing_sweep_point_reports_its_index() {
    let case = BenchmarkCase::new(
        "strict",
        |n: &usize| -> Result<Vec<u8>, BoxError> {
            if *n == 0 {
                return Err("empty input".into());
            }
            Ok(vec![0; *n])
        },
        VariantRegistry::new().in_process("noop", |_: &mut Vec<u8>| Ok(())).finish(),
    );

    let err = harness(1, 1, 0).run_sweep(&case, &[8, 4, 0, 2]).unwrap_err();
    assert!(matches!(err, HarnessError::SweepPoint { index: 2, .. }));
    assert!(matches!(err.root(), HarnessError::Construction { .. }));
    assert_eq!(err.case(), Some("strict"));
}

#[cfg(target_os = "linux")]
mod external {
    use super::*;
    use perfsuite::ExternalProcessError;

    fn native_case(target: &str) -> BenchmarkCase<usize, usize> {
        BenchmarkCase::new(
            "native",
            |n: &usize| Ok(*n),
            VariantRegistry::new()
                .external("Native", target, |n: &usize| vec![n.to_string()])
                .finish(),
        )
    }

    #[test]
    fn external_variant_reports_its_own_time() {
        let resolver = PrebuiltResolver::new().with("echo", "/bin/echo");
        let harness = harness_with(config(3, 5, 2), resolver);

        let results = harness.run_case(&native_case("echo"), &1_500_000).unwrap();
        let native = results.get("Native").unwrap();

        // One invocation per repetition, whatever the trial count
        assert_eq!(native.n(), 3);
        assert_eq!(*native, 1.5);
        assert_eq!(native.std(), 0.0);
    }

    #[test]
    fn non_zero_exit_yields_no_result() {
        let resolver = PrebuiltResolver::new().with("fail", "/bin/false");
        let harness = harness_with(config(2, 1, 0), resolver);

        let err = harness.run_case(&native_case("fail"), &10).unwrap_err();
        match err {
            HarnessError::ExternalProcess { label, source, .. } => {
                assert_eq!(label, "Native");
                assert!(matches!(source, ExternalProcessError::NonZeroExit { code: Some(1), .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

struct CountingSuite {
    name: &'static str,
    case: BenchmarkCase<Vec<u32>>,
}

impl CountingSuite {
    fn new(name: &'static str) -> Self {
        let case = BenchmarkCase::new(
            name,
            |point: &SweepPoint| -> Result<Vec<u32>, BoxError> {
                let n = point
                    .first_or("n")
                    .and_then(ParamValue::as_usize)
                    .ok_or("missing length")?;
                Ok(vec![1; n])
            },
            VariantRegistry::new()
                .in_process("sum", |v: &mut Vec<u32>| {
                    std::hint::black_box(v.iter().sum::<u32>());
                    Ok(())
                })
                .finish(),
        );
        Self { name, case }
    }
}

impl Suite for CountingSuite {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Sum of ones"
    }

    fn variant_labels(&self) -> Vec<String> {
        self.case.variants().labels().into_iter().map(String::from).collect()
    }

    fn default_sweep(&self) -> Vec<SweepPoint> {
        vec![SweepPoint::from(32usize)]
    }

    fn run_case(&self, harness: &Harness, point: &SweepPoint) -> Result<ResultSet, HarnessError> {
        harness.run_case(&self.case, point)
    }

    fn run_sweep(&self, harness: &Harness, sweep: &[SweepPoint]) -> Result<MergedSeries, HarnessError> {
        harness.run_sweep(&self.case, sweep)
    }
}

#[test]
fn profile_all_runs_each_suite_at_one_point() {
    let first = CountingSuite::new("first");
    let second = CountingSuite::new("second");
    let suites: [&dyn Suite; 2] = [&first, &second];

    let profiled = profile_all(&harness(2, 2, 0), &suites, &SweepPoint::named([("n", 128)])).unwrap();

    let names: Vec<&str> = profiled.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert!(profiled.iter().all(|(_, results)| results.get("sum").unwrap().n() == 4));
}
