//! Timing infrastructure for in-process variants.
//!
//! One [`Clock`] is chosen per harness and used for every in-process
//! variant of a run, so that two variants are never compared across
//! different time sources:
//! - Process CPU time (`CLOCK_PROCESS_CPUTIME_ID`) when the platform
//!   provides it with at least microsecond resolution
//! - Monotonic wall-clock time otherwise, or with the `use_time` feature

use crate::error::ClockError;
use std::time::Instant;

/// Default number of fresh case instances per case run.
pub const DEFAULT_REPETITIONS: usize = 10;
/// Default number of timed invocations per in-process variant and repetition.
pub const DEFAULT_TRIALS: usize = 1;
/// Default number of untimed invocations before the timed ones.
pub const DEFAULT_WARMUP: usize = 1;

/// Coarsest clock resolution accepted for process CPU time.
const MAX_RESOLUTION_NS: u64 = 1_000;

// ============================================================================
// Configuration
// ============================================================================

/// CPU pinning strategy during measurements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinStrategy {
    /// Leave scheduling to the OS
    Disabled,
    /// Pin once for a whole case run
    #[default]
    Global,
    /// Pin/unpin around each timed invocation
    PerExecution,
}

/// Configuration for the measurement protocol
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Fresh case instances per case run (default: 10)
    pub repetitions: usize,
    /// Timed invocations per in-process variant and repetition (default: 1)
    pub trials: usize,
    /// Untimed invocations per in-process variant and repetition (default: 1)
    pub warmup: usize,
    /// CPU pinning strategy (default: Global)
    pub pin_strategy: PinStrategy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            trials: DEFAULT_TRIALS,
            warmup: DEFAULT_WARMUP,
            pin_strategy: PinStrategy::default(),
        }
    }
}

impl TimingConfig {
    /// Reject configurations that cannot produce a sample.
    pub fn validate(&self) -> Result<(), String> {
        if self.repetitions == 0 {
            return Err("repetitions must be at least 1".to_string());
        }
        if self.trials == 0 {
            return Err("trials must be at least 1".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Time source for in-process samples. All readings are nanoseconds.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    /// CPU time consumed by the whole process
    ProcessCpu,
    /// Monotonic wall-clock time since `origin`
    Wall { origin: Instant },
}

impl Clock {
    /// Pick the best clock available on this platform.
    ///
    /// Process CPU time is preferred; the `use_time` feature forces the
    /// wall clock.
    pub fn detect() -> Self {
        if cfg!(feature = "use_time") {
            return Self::wall();
        }
        if process_cpu::supported() {
            Clock::ProcessCpu
        } else {
            log::warn!("process CPU clock unavailable, timing with the wall clock");
            Self::wall()
        }
    }

    pub fn wall() -> Self {
        Clock::Wall {
            origin: Instant::now(),
        }
    }

    /// Current reading in nanoseconds.
    #[inline(always)]
    pub fn now(&self) -> Result<u64, ClockError> {
        match self {
            Clock::ProcessCpu => self.checked(process_cpu::read()),
            Clock::Wall { origin } => Ok(origin.elapsed().as_nanos() as u64),
        }
    }

    fn checked(&self, reading: Option<u64>) -> Result<u64, ClockError> {
        reading.ok_or(ClockError { clock: self.name() })
    }

    /// Run `f` and return the elapsed nanoseconds with its output.
    #[inline(always)]
    pub fn measure<R>(&self, f: impl FnOnce() -> R) -> Result<(u64, R), ClockError> {
        let start = self.now()?;
        let result = f();
        let end = self.now()?;
        Ok((end.saturating_sub(start), result))
    }

    /// Human-readable name of the time source.
    pub fn name(&self) -> &'static str {
        match self {
            Clock::ProcessCpu => "process CPU time",
            Clock::Wall { .. } => "wall clock",
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(unix)]
mod process_cpu {
    use super::MAX_RESOLUTION_NS;

    fn to_nanos(ts: &libc::timespec) -> u64 {
        ts.tv_sec as u64 * 1_000_000_000 + ts.tv_nsec as u64
    }

    pub fn supported() -> bool {
        let mut res = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let rc = unsafe { libc::clock_getres(libc::CLOCK_PROCESS_CPUTIME_ID, &mut res) };
        rc == 0 && to_nanos(&res) <= MAX_RESOLUTION_NS && read().is_some()
    }

    #[inline(always)]
    pub fn read() -> Option<u64> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
        (rc == 0).then(|| to_nanos(&ts))
    }
}

#[cfg(not(unix))]
mod process_cpu {
    pub fn supported() -> bool {
        false
    }

    pub fn read() -> Option<u64> {
        None
    }
}
