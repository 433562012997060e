//! Build script for relay mux firmware
//!
//! Handles:
//! - Linker scripts for the Cortex-M binary (cortex-m-rt and defmt)
//! - Nothing at all for host builds with the `std` feature

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host test builds link normally
    if std::env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    // memory.x comes from embassy-stm32's `memory-x` feature
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
