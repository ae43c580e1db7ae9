//! Informational report of the vector unit the engine's kernels run on.
//!
//! The values never change transform results; they exist for diagnostics.

use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VectorUnit {
    name: &'static str,
    /// Register width in bytes, 0 when no vector unit is used.
    bytes: usize,
}

#[cfg(target_arch = "x86_64")]
fn detect() -> VectorUnit {
    if std::arch::is_x86_feature_detected!("avx") && std::arch::is_x86_feature_detected!("fma") {
        VectorUnit {
            name: "AVX",
            bytes: 32,
        }
    } else if std::arch::is_x86_feature_detected!("sse4.1") {
        VectorUnit {
            name: "SSE4.1",
            bytes: 16,
        }
    } else {
        VectorUnit {
            name: "SSE2",
            bytes: 16,
        }
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> VectorUnit {
    VectorUnit {
        name: "NEON",
        bytes: 16,
    }
}

#[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
fn detect() -> VectorUnit {
    VectorUnit {
        name: "WASM SIMD128",
        bytes: 16,
    }
}

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    all(target_arch = "wasm32", target_feature = "simd128")
)))]
fn detect() -> VectorUnit {
    VectorUnit {
        name: "scalar",
        bytes: 0,
    }
}

/// Name of the detected vector instruction set, `"scalar"` when none.
pub fn simd_arch() -> &'static str {
    detect().name
}

/// Number of `S` lanes in one vector register, 1 when scalar.
pub fn simd_width<S>() -> usize {
    (detect().bytes / mem::size_of::<S>()).max(1)
}
