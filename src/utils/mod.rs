//! Utility modules for timing, pinning, fixtures and export.

pub mod bench;
pub mod cpu_affinity;
pub mod export;
pub mod timer;

// Re-export commonly used items
pub use cpu_affinity::CpuPinGuard;
pub use timer::{Clock, PinStrategy, TimingConfig};

/// C compiler name detected at build time
pub const C_COMPILER_NAME: Option<&str> = option_env!("C_COMPILER_NAME");
