//! Thread pinning for case runs.
//!
//! Pinning is best-effort: on platforms without affinity support the guard
//! reports that it is not pinned.

#[cfg(target_os = "linux")]
mod platform {
    pub struct Saved(libc::cpu_set_t);

    pub fn current_cpu() -> Option<usize> {
        let cpu = unsafe { libc::sched_getcpu() };
        (cpu >= 0).then_some(cpu as usize)
    }

    pub fn pin(core_id: usize) -> Option<Saved> {
        unsafe {
            let mut saved: libc::cpu_set_t = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut saved) != 0 {
                return None;
            }

            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0 {
                Some(Saved(saved))
            } else {
                None
            }
        }
    }

    pub fn restore(saved: &Saved) -> bool {
        unsafe {
            libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &saved.0) == 0
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub struct Saved;

    pub fn current_cpu() -> Option<usize> {
        None
    }

    pub fn pin(_core_id: usize) -> Option<Saved> {
        None
    }

    pub fn restore(_saved: &Saved) -> bool {
        true
    }
}

/// RAII guard for CPU pinning - pins on creation, restores on drop.
///
/// # Example
/// ```ignore
/// {
///     let _pin = CpuPinGuard::new(); // Thread pinned
///     // ... timed invocations ...
/// } // Original affinity restored here
/// ```
pub struct CpuPinGuard {
    pinned: Option<(usize, platform::Saved)>,
}

impl CpuPinGuard {
    /// Pin to the core the thread is currently running on.
    pub fn new() -> Self {
        let core = platform::current_cpu().unwrap_or(0);
        Self {
            pinned: platform::pin(core).map(|saved| (core, saved)),
        }
    }

    /// Get the core ID this thread is pinned to, if any.
    pub fn core_id(&self) -> Option<usize> {
        self.pinned.as_ref().map(|(core, _)| *core)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if let Some((core, saved)) = self.pinned.take() {
            if !platform::restore(&saved) {
                log::warn!("failed to restore CPU affinity after pinning to core {}", core);
            }
        }
    }
}

impl Default for CpuPinGuard {
    fn default() -> Self {
        Self::new()
    }
}
