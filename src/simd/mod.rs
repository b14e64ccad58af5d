//! SIMD capability detection and runtime optimization.
//!
//! This module provides runtime detection of CPU SIMD features
//! to enable performance warnings and feature-appropriate code paths.
//!
//! # Example
//!
//! ```rust
//! use edgevec::simd::{capabilities, warn_if_suboptimal, SimdCapabilities};
//!
//! // Get detected capabilities
//! let caps = capabilities();
//! println!("AVX2 available: {}", caps.avx2);
//!
//! // Check if configuration is optimal
//! if !caps.is_optimal() {
//!     // Warn user about performance impact
//!     warn_if_suboptimal();
//! }
//! ```
//!
//! # Backend Selection
//!
//! ```rust
//! use edgevec::simd::{select_backend, SimdBackend};
//!
//! let backend = select_backend();
//! match backend {
//!     SimdBackend::Avx2 => println!("Using AVX2 (256-bit)"),
//!     SimdBackend::Avx => println!("Using AVX (256-bit)"),
//!     SimdBackend::Sse41 => println!("Using SSE4.1 (128-bit)"),
//!     SimdBackend::Neon => println!("Using NEON (128-bit)"),
//!     SimdBackend::Portable => println!("Using portable fallback"),
//! }
//! ```

pub mod detect;

pub use detect::{capabilities, warn_if_suboptimal, SimdCapabilities};

/// Available SIMD backends for runtime dispatch.
///
/// The backend is selected at runtime based on CPU feature detection.
/// Priority order: AVX2 > AVX > SSE4.1 > NEON > Portable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdBackend {
    /// AVX2 (256-bit vectors) - x86_64 only
    Avx2,
    /// AVX (256-bit vectors, no integer ops) - x86_64 only
    Avx,
    /// SSE4.1 (128-bit vectors) - x86_64 only
    Sse41,
    /// ARM NEON (128-bit vectors) - aarch64 only
    Neon,
    /// Portable fallback - all platforms
    Portable,
}

impl SimdBackend {
    /// Returns a human-readable name for this backend.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Avx2 => "AVX2",
            Self::Avx => "AVX",
            Self::Sse41 => "SSE4.1",
            Self::Neon => "NEON",
            Self::Portable => "Portable",
        }
    }

    /// Returns true if this is a SIMD-accelerated backend.
    #[must_use]
    pub fn is_simd(&self) -> bool {
        !matches!(self, Self::Portable)
    }

    /// Returns the vector width in bits for this backend.
    #[must_use]
    pub fn vector_width(&self) -> usize {
        match self {
            Self::Avx2 | Self::Avx => 256,
            Self::Sse41 | Self::Neon => 128,
            Self::Portable => 0,
        }
    }
}

impl std::fmt::Display for SimdBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect NEON SIMD support at runtime.
///
/// Returns `true` on ARM64 platforms with NEON support (most ARM64 CPUs).
/// Returns `false` on all other platforms.
///
/// # Example
///
/// ```rust
/// use edgevec::simd::detect_neon;
///
/// if detect_neon() {
///     println!("NEON SIMD available!");
/// }
/// ```
#[inline]
#[must_use]
pub fn detect_neon() -> bool {
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("neon")
    }

    #[cfg(not(target_arch = "aarch64"))]
    {
        false // NEON only exists on ARM
    }
}

/// Select the best available SIMD backend for the current CPU.
///
/// This function performs runtime detection and returns the fastest
/// available backend:
///
/// - **x86_64 with AVX2**: Returns `SimdBackend::Avx2`
/// - **aarch64 with NEON**: Returns `SimdBackend::Neon`
/// - **All other platforms**: Returns `SimdBackend::Portable`
///
/// # Example
///
/// ```rust
/// use edgevec::simd::{select_backend, SimdBackend};
///
/// let backend = select_backend();
/// println!("Using {} backend", backend);
/// ```
#[must_use]
pub fn select_backend() -> SimdBackend {
    #[cfg(target_arch = "x86_64")]
    {
        // Priority: AVX2 > AVX > SSE4.1 > Portable
        if is_x86_feature_detected!("avx2") {
            return SimdBackend::Avx2;
        }
        if is_x86_feature_detected!("avx") {
            return SimdBackend::Avx;
        }
        if is_x86_feature_detected!("sse4.1") {
            return SimdBackend::Sse41;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if detect_neon() {
            return SimdBackend::Neon;
        }
    }

    SimdBackend::Portable
}
