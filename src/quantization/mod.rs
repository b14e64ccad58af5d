//! Quantization logic for the vector store's encoding families (§4.C).
//!
//! Three families are required: raw `f32` passthrough (no module here — the
//! vector store handles it directly, there being nothing to quantize),
//! [`scalar`] (SQ8, global min-max affine), and [`pq`] (product quantization,
//! 256-way codebooks over sub-dimensions with precomputed distance tables).

/// Product quantization (PQ).
pub mod pq;
/// Scalar quantization (SQ8).
pub mod scalar;

pub use pq::ProductQuantizer;
pub use scalar::{QuantizerConfig, ScalarQuantizer};

use thiserror::Error;

/// Errors raised by a quantizer's train/encode/decode path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantizationError {
    /// A vector's dimension did not match the quantizer's expected dimension.
    #[error("dimension mismatch at index {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Offset of the offending sample within the training/encode batch.
        index: usize,
        /// Expected dimension.
        expected: usize,
        /// Actual dimension observed.
        actual: usize,
    },

    /// `dim` is not evenly divisible by the requested sub-vector count.
    #[error("dim {dim} is not a multiple of {required_multiple_of}")]
    InvalidDimension {
        /// The dimension that failed the divisibility check.
        dim: usize,
        /// The sub-vector count it needed to be a multiple of.
        required_multiple_of: usize,
    },

    /// Fewer training samples were offered than the codebook requires.
    #[error("insufficient training data: have {have}, need at least {need}")]
    InsufficientTrainingData {
        /// Samples actually offered.
        have: usize,
        /// Minimum samples required.
        need: usize,
    },
}
