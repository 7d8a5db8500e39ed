// Copyright 2025 the Nvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build step.

fn main() {
    println!("cargo:rerun-if-env-changed=NVG_CI_GPU_SUPPORT");
    println!("cargo:rustc-check-cfg=cfg(skip_gpu_tests)");
    let value = std::env::var("NVG_CI_GPU_SUPPORT").unwrap_or_default();
    if matches!(value.to_ascii_lowercase().as_str(), "no" | "n") {
        println!("cargo:rustc-cfg=skip_gpu_tests");
    }
}
