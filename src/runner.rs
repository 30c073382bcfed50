//! Single-sample execution of one variant against one case instance.

use crate::error::{BoxError, HarnessError};
use crate::external::ExternalRunner;
use crate::registry::{ArgsFn, InProcessFn, Variant, VariantEntry};
use crate::utils::timer::Clock;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::panic::{self, AssertUnwindSafe};

/// Produces one elapsed-time sample per call.
pub struct VariantRunner<'a> {
    clock: Clock,
    external: &'a ExternalRunner,
}

impl<'a> VariantRunner<'a> {
    pub fn new(clock: Clock, external: &'a ExternalRunner) -> Self {
        Self { clock, external }
    }

    /// Executable path of an external variant, `None` for in-process ones.
    /// Builds the target on first use.
    pub fn resolve<C>(&self, case: &str, entry: &VariantEntry<C>) -> Result<Option<PathBuf>, HarnessError> {
        match entry.variant.target() {
            Some(target) => self.resolve_target(case, &entry.label, target).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_target(&self, case: &str, label: &str, target: &str) -> Result<PathBuf, HarnessError> {
        self.external
            .resolve(target)
            .map_err(|source| HarnessError::BuildResolution {
                case: case.to_string(),
                label: label.to_string(),
                source,
            })
    }

    /// One sample in nanoseconds for `entry` against `instance`.
    ///
    /// `executable` is the path returned by [`VariantRunner::resolve`]; an
    /// external variant without one is resolved here.
    pub fn sample<C>(
        &self,
        case: &str,
        entry: &VariantEntry<C>,
        executable: Option<&Path>,
        instance: &mut C,
    ) -> Result<u64, HarnessError> {
        match &entry.variant {
            Variant::InProcess(f) => self.time_in_process(f, instance).map_err(|source| {
                HarnessError::VariantExecution {
                    case: case.to_string(),
                    label: entry.label.clone(),
                    source,
                }
            }),
            Variant::External { target, args } => match executable {
                Some(path) => self.run_external(case, &entry.label, path, args, instance),
                None => {
                    let path = self.resolve_target(case, &entry.label, target)?;
                    self.run_external(case, &entry.label, &path, args, instance)
                }
            },
        }
    }

    /// Run an in-process variant without timing it.
    pub fn warm_up<C>(&self, case: &str, entry: &VariantEntry<C>, instance: &mut C) -> Result<(), HarnessError> {
        if let Variant::InProcess(f) = &entry.variant {
            call_guarded(|| f(instance)).map_err(|source| HarnessError::VariantExecution {
                case: case.to_string(),
                label: entry.label.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn time_in_process<C>(&self, f: &InProcessFn<C>, instance: &mut C) -> Result<u64, BoxError> {
        let clock = self.clock;
        let mut elapsed = 0;
        call_guarded(|| {
            let start = clock.now()?;
            let outcome = f(instance);
            elapsed = clock.now()?.saturating_sub(start);
            outcome
        })?;
        Ok(elapsed)
    }

    fn run_external<C>(
        &self,
        case: &str,
        label: &str,
        path: &Path,
        args: &ArgsFn<C>,
        instance: &C,
    ) -> Result<u64, HarnessError> {
        let args = args(instance);
        log::debug!("{} / {}: {} {:?}", case, label, path.display(), args);

        self.external
            .invoke(path, &args)
            .map_err(|source| HarnessError::ExternalProcess {
                case: case.to_string(),
                label: label.to_string(),
                source,
            })
    }
}

/// Call a variant, turning a panic into an error.
fn call_guarded(f: impl FnOnce() -> Result<(), BoxError>) -> Result<(), BoxError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(panic_message(payload).into()),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
