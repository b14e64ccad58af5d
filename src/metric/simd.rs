//! SIMD primitives for distance metrics.
//!
//! This module provides platform-specific SIMD implementations.
//! They are gated by `cfg` flags and feature detection.
//!
//! # Safety
//!
//! This module uses intentional pointer casts for SIMD operations.
//! The `_mm_loadu_*` intrinsics handle unaligned loads safely.

// SIMD code requires intentional pointer casts and alignment handling.
// These lints are disabled at module level as they are false positives for SIMD code.
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::ptr_as_ptr)]
#![allow(clippy::missing_panics_doc)]

#[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
/// WASM SIMD implementations.
pub mod wasm {
    use std::arch::wasm32::*;

    /// L2 Squared distance using WASM SIMD128.
    ///
    /// # Safety
    ///
    /// Requires `simd128` target feature.
    #[inline]
    pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len());
        unsafe {
            let n = a.len();
            let mut i = 0;

            // 4 accumulators to break dependency chains and increase ILP
            let mut sum0 = f32x4_splat(0.0);
            let mut sum1 = f32x4_splat(0.0);
            let mut sum2 = f32x4_splat(0.0);
            let mut sum3 = f32x4_splat(0.0);

            // Process 16 floats (4 vectors) per iteration
            while i + 16 <= n {
                let ptr_a = a.as_ptr().add(i) as *const v128;
                let ptr_b = b.as_ptr().add(i) as *const v128;

                // Load 4 vectors from each array
                let a0 = v128_load(ptr_a);
                let b0 = v128_load(ptr_b);
                let a1 = v128_load(ptr_a.add(1));
                let b1 = v128_load(ptr_b.add(1));
                let a2 = v128_load(ptr_a.add(2));
                let b2 = v128_load(ptr_b.add(2));
                let a3 = v128_load(ptr_a.add(3));
                let b3 = v128_load(ptr_b.add(3));

                // Compute diffs
                let d0 = f32x4_sub(a0, b0);
                let d1 = f32x4_sub(a1, b1);
                let d2 = f32x4_sub(a2, b2);
                let d3 = f32x4_sub(a3, b3);

                // Accumulate squares
                sum0 = f32x4_add(sum0, f32x4_mul(d0, d0));
                sum1 = f32x4_add(sum1, f32x4_mul(d1, d1));
                sum2 = f32x4_add(sum2, f32x4_mul(d2, d2));
                sum3 = f32x4_add(sum3, f32x4_mul(d3, d3));

                i += 16;
            }

            // Reduce accumulators to single vector
            let sum_mid = f32x4_add(f32x4_add(sum0, sum1), f32x4_add(sum2, sum3));
            let mut sum_v = sum_mid;

            // Handle remaining chunks of 4
            while i + 4 <= n {
                let va = v128_load(a.as_ptr().add(i) as *const v128);
                let vb = v128_load(b.as_ptr().add(i) as *const v128);
                let diff = f32x4_sub(va, vb);
                sum_v = f32x4_add(sum_v, f32x4_mul(diff, diff));
                i += 4;
            }

            // Reduce vector to scalar
            let mut sum = f32x4_extract_lane::<0>(sum_v)
                + f32x4_extract_lane::<1>(sum_v)
                + f32x4_extract_lane::<2>(sum_v)
                + f32x4_extract_lane::<3>(sum_v);

            // Scalar tail
            while i < n {
                let diff = *a.get_unchecked(i) - *b.get_unchecked(i);
                sum += diff * diff;
                i += 1;
            }
            sum
        }
    }

    /// Dot Product using WASM SIMD128.
    ///
    /// # Safety
    ///
    /// Requires `simd128` target feature.
    #[inline]
    pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len());
        unsafe {
            let n = a.len();
            let mut i = 0;

            let mut sum0 = f32x4_splat(0.0);
            let mut sum1 = f32x4_splat(0.0);
            let mut sum2 = f32x4_splat(0.0);
            let mut sum3 = f32x4_splat(0.0);

            while i + 16 <= n {
                let ptr_a = a.as_ptr().add(i) as *const v128;
                let ptr_b = b.as_ptr().add(i) as *const v128;

                let a0 = v128_load(ptr_a);
                let b0 = v128_load(ptr_b);
                let a1 = v128_load(ptr_a.add(1));
                let b1 = v128_load(ptr_b.add(1));
                let a2 = v128_load(ptr_a.add(2));
                let b2 = v128_load(ptr_b.add(2));
                let a3 = v128_load(ptr_a.add(3));
                let b3 = v128_load(ptr_b.add(3));

                sum0 = f32x4_add(sum0, f32x4_mul(a0, b0));
                sum1 = f32x4_add(sum1, f32x4_mul(a1, b1));
                sum2 = f32x4_add(sum2, f32x4_mul(a2, b2));
                sum3 = f32x4_add(sum3, f32x4_mul(a3, b3));

                i += 16;
            }

            let mut sum_v = f32x4_add(f32x4_add(sum0, sum1), f32x4_add(sum2, sum3));

            while i + 4 <= n {
                let va = v128_load(a.as_ptr().add(i) as *const v128);
                let vb = v128_load(b.as_ptr().add(i) as *const v128);
                sum_v = f32x4_add(sum_v, f32x4_mul(va, vb));
                i += 4;
            }

            let mut sum = f32x4_extract_lane::<0>(sum_v)
                + f32x4_extract_lane::<1>(sum_v)
                + f32x4_extract_lane::<2>(sum_v)
                + f32x4_extract_lane::<3>(sum_v);

            while i < n {
                sum += *a.get_unchecked(i) * *b.get_unchecked(i);
                i += 1;
            }
            sum
        }
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
/// x86 AVX2 implementations.
pub mod x86 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::{
        __m256, _mm256_add_ps, _mm256_castps256_ps128, _mm256_extractf128_ps, _mm256_loadu_ps,
        _mm256_mul_ps, _mm256_setzero_ps, _mm256_sub_ps, _mm_add_ps, _mm_add_ss, _mm_cvtss_f32,
        _mm_movehl_ps, _mm_shuffle_ps,
    };

    #[cfg(all(target_arch = "x86_64", target_feature = "fma"))]
    use std::arch::x86_64::_mm256_fmadd_ps;

    /// L2 Squared distance using AVX2.
    ///
    /// # Safety
    ///
    /// Requires `avx2` target feature to be enabled at compile time.
    #[inline]
    #[must_use]
    pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len());
        unsafe {
            let n = a.len();
            let mut i = 0;
            let mut sum256 = _mm256_setzero_ps();

            // Process 8 floats per iteration (32 bytes)
            // Unrolling to 4 registers (32 floats) helps pipelining
            // but simple 8-float loop is already much faster than scalar.
            // Let's implement moderate unrolling (2x = 16 floats).
            while i + 16 <= n {
                let va1 = _mm256_loadu_ps(a.as_ptr().add(i));
                let vb1 = _mm256_loadu_ps(b.as_ptr().add(i));
                let diff1 = _mm256_sub_ps(va1, vb1);

                // FMA: sum += diff * diff
                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(diff1, diff1, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    let sq1 = _mm256_mul_ps(diff1, diff1);
                    sum256 = _mm256_add_ps(sum256, sq1);
                }

                let va2 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
                let vb2 = _mm256_loadu_ps(b.as_ptr().add(i + 8));
                let diff2 = _mm256_sub_ps(va2, vb2);

                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(diff2, diff2, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    let sq2 = _mm256_mul_ps(diff2, diff2);
                    sum256 = _mm256_add_ps(sum256, sq2);
                }

                i += 16;
            }

            // Single block loop for remaining chunks of 8
            while i + 8 <= n {
                let va = _mm256_loadu_ps(a.as_ptr().add(i));
                let vb = _mm256_loadu_ps(b.as_ptr().add(i));
                let diff = _mm256_sub_ps(va, vb);

                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(diff, diff, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    let sq = _mm256_mul_ps(diff, diff);
                    sum256 = _mm256_add_ps(sum256, sq);
                }
                i += 8;
            }

            // Horizontal sum of 256-bit register
            // [h, g, f, e, d, c, b, a] -> sum
            let mut sum = hsum256_ps_avx(sum256);

            // Scalar tail
            while i < n {
                let diff = *a.get_unchecked(i) - *b.get_unchecked(i);
                sum += diff * diff;
                i += 1;
            }

            sum
        }
    }

    /// Dot Product using AVX2.
    ///
    /// # Safety
    ///
    /// Requires `avx2` target feature to be enabled at compile time.
    #[inline]
    #[must_use]
    pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len());
        unsafe {
            let n = a.len();
            let mut i = 0;
            let mut sum256 = _mm256_setzero_ps();

            while i + 16 <= n {
                let va1 = _mm256_loadu_ps(a.as_ptr().add(i));
                let vb1 = _mm256_loadu_ps(b.as_ptr().add(i));

                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(va1, vb1, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    sum256 = _mm256_add_ps(sum256, _mm256_mul_ps(va1, vb1));
                }

                let va2 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
                let vb2 = _mm256_loadu_ps(b.as_ptr().add(i + 8));

                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(va2, vb2, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    sum256 = _mm256_add_ps(sum256, _mm256_mul_ps(va2, vb2));
                }
                i += 16;
            }

            while i + 8 <= n {
                let va = _mm256_loadu_ps(a.as_ptr().add(i));
                let vb = _mm256_loadu_ps(b.as_ptr().add(i));

                #[cfg(target_feature = "fma")]
                {
                    sum256 = _mm256_fmadd_ps(va, vb, sum256);
                }
                #[cfg(not(target_feature = "fma"))]
                {
                    sum256 = _mm256_add_ps(sum256, _mm256_mul_ps(va, vb));
                }
                i += 8;
            }

            let mut sum = hsum256_ps_avx(sum256);

            while i < n {
                sum += *a.get_unchecked(i) * *b.get_unchecked(i);
                i += 1;
            }

            sum
        }
    }

    /// Horizontal sum of f32x8
    #[inline]
    unsafe fn hsum256_ps_avx(v: __m256) -> f32 {
        // High 128 + Low 128
        let x128 = _mm_add_ps(_mm256_extractf128_ps(v, 1), _mm256_castps256_ps128(v));
        // Shuffle and add
        let x64 = _mm_add_ps(x128, _mm_movehl_ps(x128, x128));
        let x32 = _mm_add_ss(x64, _mm_shuffle_ps(x64, x64, 0x55));
        _mm_cvtss_f32(x32)
    }
}
