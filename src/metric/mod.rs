//! Distance kernels (§4.B).
//!
//! Two scalar distances are required: `L2Sqr` and `IP` (inner-product
//! expressed as a *distance*, `1 - Σ a_i·b_i`, so smaller is always closer
//! regardless of metric). Each kernel dispatches at runtime to the best
//! available vector ISA via [`simd`], with a scalar fallback that every
//! variant is checked against for matching result ordering.

/// Runtime-dispatched SIMD kernels (AVX2 / WASM SIMD128 / scalar).
pub mod simd;

mod dot;
mod l2;

pub use dot::DotProduct;
pub use l2::L2Squared;

/// A distance function over vectors of `T`. Smaller return values mean closer.
pub trait Metric<T> {
    /// Compute the distance between `a` and `b`. Panics on length mismatch.
    fn distance(a: &[T], b: &[T]) -> f32;
}

/// Inner-product expressed as a distance: `1 - Σ a_i·b_i`.
///
/// `DotProduct` computes the raw similarity sum; this wrapper negates it into
/// the distance form §4.B specifies so it can share the same `Metric` trait
/// (and therefore the same beam-search code) as [`L2Squared`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProduct;

impl Metric<f32> for InnerProduct {
    #[inline]
    fn distance(a: &[f32], b: &[f32]) -> f32 {
        1.0 - DotProduct::distance(a, b)
    }
}

/// Build-time selector between the two required metrics.
///
/// Named `MetricKind` (not `Metric`, which is the trait) to match how the
/// parameter bag in [`crate::params`] refers to it: `metric_type ∈ {l2, ip}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// `L2Sqr(a, b) = Σ(a_i - b_i)²`.
    L2,
    /// `IP(a, b) = 1 - Σ a_i·b_i`.
    Ip,
}

impl MetricKind {
    /// Dispatch to the selected metric's distance function over `f32` vectors.
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            MetricKind::L2 => L2Squared::distance(a, b),
            MetricKind::Ip => InnerProduct::distance(a, b),
        }
    }
}
