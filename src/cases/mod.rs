//! Bundled benchmark cases.
//!
//! Each case compares pure-Rust workloads, a C kernel (when a compatible
//! compiler was found at build time) and a native executable built from
//! the matching target under `benches/`.

pub mod backwards;
pub mod c_impl;
pub mod mul_f32;
pub mod sum_f32;

use crate::error::BoxError;
use crate::sweep::{ParamValue, SweepPoint};

/// Buffer length of a sweep point: positional 0 or the named parameter `n`.
pub fn length_param(case: &str, point: &SweepPoint) -> Result<usize, BoxError> {
    point
        .first_or("n")
        .and_then(ParamValue::as_usize)
        .ok_or_else(|| format!("{} expects a non-negative length, got {}", case, point).into())
}

/// Powers of two from `2^from` to `2^to`, every `step` exponents.
pub fn power_of_two_sweep(from: u32, to: u32, step: usize) -> Vec<SweepPoint> {
    (from..=to)
        .step_by(step)
        .map(|p| SweepPoint::from(1usize << p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_param() {
        assert_eq!(length_param("x", &SweepPoint::from(64usize)).unwrap(), 64);
        assert_eq!(length_param("x", &SweepPoint::named([("n", 8)])).unwrap(), 8);
        assert!(length_param("x", &SweepPoint::from(-1)).is_err());
        assert!(length_param("x", &SweepPoint::from("big")).is_err());
    }

    #[test]
    fn test_power_of_two_sweep() {
        let sweep = power_of_two_sweep(9, 13, 2);
        assert_eq!(
            sweep,
            vec![SweepPoint::from(512usize), SweepPoint::from(2048usize), SweepPoint::from(8192usize)]
        );
    }
}
