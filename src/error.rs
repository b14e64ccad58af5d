//! Unified error hierarchy for EdgeVec.
//!
//! [`Error`] is the single type every public entry point returns. Component-local
//! error enums (`GraphError`, `StorageError`, `QuantizationError`, `PersistenceError`)
//! exist where a component has failure modes that don't map 1:1 onto the top-level
//! taxonomy, and convert into [`Error`] via `#[from]` at the API boundary.

use thiserror::Error;

/// Top-level error type returned by every fallible public operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed parameters, dimension mismatch, zero `num_elements` on add, bad JSON.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Label already present on add.
    #[error("duplicate label: {0}")]
    DuplicateLabel(u64),

    /// Vector store or quantizer used before a successful `train`.
    #[error("component used before train")]
    NotTrained,

    /// Allocator failure.
    #[error("out of memory")]
    OutOfMemory,

    /// Graph operation would exceed `max_degree`.
    #[error("degree overflow: attempted {attempted}, max {max}")]
    DegreeOverflow {
        /// Number of neighbors the caller tried to store.
        attempted: usize,
        /// Configured maximum degree.
        max: usize,
    },

    /// Deserialized parameter tree does not match the constructor's.
    #[error("incompatible index: {0}")]
    IncompatibleIndex(String),

    /// Serialization read-side fault.
    #[error("read error: {0}")]
    ReadError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Serialization write-side fault.
    #[error("write error: {0}")]
    WriteError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invariant violation; treated as a bug rather than caller misuse.
    #[error("internal error: {0}")]
    InternalError(String),

    /// Deadline expired; only returned when a deadline was explicitly supplied.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<crate::storage::StorageError> for Error {
    fn from(e: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError as SE;
        match e {
            SE::InvalidDim { .. } => Error::InvalidArgument(e.to_string()),
            SE::NotTrained => Error::NotTrained,
            SE::AlreadyTrained => Error::InvalidArgument(e.to_string()),
            SE::OutOfMemory => Error::OutOfMemory,
            SE::Quantization(q) => q.into(),
        }
    }
}

impl From<crate::quantization::QuantizationError> for Error {
    fn from(e: crate::quantization::QuantizationError) -> Self {
        Error::InvalidArgument(e.to_string())
    }
}

impl From<crate::graph::GraphError> for Error {
    fn from(e: crate::graph::GraphError) -> Self {
        use crate::graph::GraphError as GE;
        match e {
            GE::DegreeOverflow { attempted, max } => Error::DegreeOverflow { attempted, max },
            GE::OutOfRange { .. } => Error::InternalError(e.to_string()),
            GE::CompressedDegreeTooLarge { .. } => Error::InvalidArgument(e.to_string()),
        }
    }
}

impl From<crate::persistence::PersistenceError> for Error {
    fn from(e: crate::persistence::PersistenceError) -> Self {
        use crate::persistence::PersistenceError as PE;
        match e {
            PE::Io(_) | PE::Corrupted(_) | PE::ChecksumMismatch { .. } | PE::InvalidMagic { .. }
            | PE::TruncatedData => Error::ReadError(Box::new(e)),
            PE::IncompatibleParams(msg) => Error::IncompatibleIndex(msg),
            PE::SerializationError(_) => Error::WriteError(Box::new(e)),
        }
    }
}

/// Errors specific to batch `add` calls, surfaced alongside per-vector [`Error`]s.
///
/// Unlike [`Error`], which is one failure per call, a batch can partially succeed;
/// callers get back the list of successes plus one `BatchError` per rejected entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// No vectors offered in the dataset.
    #[error("empty batch: cannot insert zero vectors")]
    EmptyBatch,

    /// Vector dimensionality does not match index configuration.
    #[error("dimension mismatch at offset {offset}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension from index configuration.
        expected: usize,
        /// Actual dimension observed.
        actual: usize,
        /// Offset of the offending vector within the batch.
        offset: usize,
    },

    /// Label already exists in the index.
    #[error("duplicate label: {label}")]
    DuplicateId {
        /// Duplicate label.
        label: u64,
    },

    /// Vector contains non-finite floating point values.
    #[error("invalid vector at offset {offset}: {reason}")]
    InvalidVector {
        /// Offset of the invalid vector within the batch.
        offset: usize,
        /// Description of the invalid value.
        reason: String,
    },
}
