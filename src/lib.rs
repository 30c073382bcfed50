//! # perfsuite
//!
//! A micro-benchmark harness comparing implementation variants of the same
//! operation. Variants run in-process as Rust closures or out-of-process as
//! native executables that report their own elapsed time.

pub mod case;
pub mod cases;
pub mod catalog;
pub mod error;
pub mod external;
pub mod harness;
pub mod registry;
pub mod result;
pub mod runner;
pub mod sweep;
pub mod tui;
pub mod utils;

pub use case::BenchmarkCase;
pub use error::{BoxError, BuildResolutionError, ClockError, ExternalProcessError, HarnessError};
pub use external::{ArgEncoding, ExternalConfig, ExternalRunner};
pub use harness::Harness;
pub use registry::{Variant, VariantRegistry, VariantTable};
pub use result::VariantResult;
pub use sweep::{MergedSeries, ParamValue, ResultSet, SweepPoint};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::case::BenchmarkCase;
    pub use crate::catalog::{build_catalog, profile_all, Suite, SuiteCatalog};
    pub use crate::error::{BoxError, HarnessError};
    pub use crate::harness::Harness;
    pub use crate::registry::{VariantRegistry, VariantTable};
    pub use crate::result::VariantResult;
    pub use crate::sweep::{MergedSeries, ResultSet, SweepPoint};
    pub use crate::utils::{Clock, PinStrategy, TimingConfig};
}
