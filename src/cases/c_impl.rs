//! FFI bindings for the C kernels compiled by `build.rs`.

#[cfg(c_implementation_active)]
mod ffi {
    use libc::size_t;
    use std::os::raw::c_float;

    extern "C" {
        pub fn mul_f32_c(a: *const c_float, b: *const c_float, out: *mut c_float, len: size_t);
        pub fn sum_f32_c(a: *const c_float, len: size_t) -> c_float;
    }
}

/// Element-wise product written into `out`
#[cfg(c_implementation_active)]
pub fn mul_f32_c(a: &[f32], b: &[f32], out: &mut [f32]) {
    assert!(a.len() == b.len() && a.len() == out.len(), "Buffers must have the same length");
    unsafe { ffi::mul_f32_c(a.as_ptr(), b.as_ptr(), out.as_mut_ptr(), a.len()) }
}

/// Sum of all elements
#[cfg(c_implementation_active)]
pub fn sum_f32_c(a: &[f32]) -> f32 {
    unsafe { ffi::sum_f32_c(a.as_ptr(), a.len()) }
}

/// Check if C implementations are available
#[cfg(c_implementation_active)]
pub const C_IMPL_AVAILABLE: bool = true;

#[cfg(not(c_implementation_active))]
pub const C_IMPL_AVAILABLE: bool = false;

// Stub implementations for missing C compiler
#[cfg(not(c_implementation_active))]
pub fn mul_f32_c(_a: &[f32], _b: &[f32], _out: &mut [f32]) {
    panic!("C implementation not compiled (requires GCC/MSVC/Apple Clang)")
}

#[cfg(not(c_implementation_active))]
pub fn sum_f32_c(_a: &[f32]) -> f32 {
    panic!("C implementation not compiled (requires GCC/MSVC/Apple Clang)")
}
