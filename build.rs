//! Build script compiling the C kernels used as an in-process variant.

use std::env;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(c_implementation_active)");

    let compiler = cc::Build::new().get_compiler();
    let compiler_name = if compiler.is_like_clang() {
        if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() == "macos" {
            "Apple Clang"
        } else {
            "Clang"
        }
    } else if compiler.is_like_gnu() {
        "GCC"
    } else if compiler.is_like_msvc() {
        "MSVC"
    } else {
        println!("cargo:warning=C compiler is not compatible (needs GCC, Clang, or MSVC). C kernels disabled.");
        return;
    };

    let rustflags = env::var("RUSTFLAGS").unwrap_or_default();
    let encoded_rustflags = env::var("CARGO_ENCODED_RUSTFLAGS").unwrap_or_default();
    let is_rust_native =
        rustflags.contains("target-cpu=native") || encoded_rustflags.contains("target-cpu=native");

    let mut build = cc::Build::new();

    // Auto-detect all C files in src/ directory
    let c_files = match glob::glob("src/**/*.c") {
        Ok(paths) => paths.filter_map(|entry| entry.ok()),
        Err(e) => {
            println!("cargo:warning=Failed to read glob pattern ({}). C kernels disabled.", e);
            return;
        }
    };

    for file in c_files {
        println!("cargo:rerun-if-changed={}", file.display());
        build.file(file);
    }

    // -O3 without -ffast-math
    build.opt_level(3);

    if is_rust_native {
        build.flag_if_supported("-march=native");
    }

    build.compile("perfsuite_kernels");

    println!("cargo:rustc-cfg=c_implementation_active");
    println!("cargo:rustc-env=C_COMPILER_NAME={}", compiler_name);
}
