//! Vector store (§4.C): holds per-`InnerId` codes and answers distance queries
//! over them. Three encoding families are supported as a tagged variant
//! (`EncodingKind`), per the §9 guidance to avoid a vtable on this hot path:
//! raw `f32` passthrough, scalar quantization (SQ8), and product quantization.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::{alloc_vec, system_allocator, AllocatorHandle};
use crate::label::InnerId;
use crate::metric::MetricKind;
use crate::quantization::{pq::PqComputer, ProductQuantizer, QuantizationError, ScalarQuantizer};

/// Errors raised by the vector store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// A vector's length did not match the store's configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    InvalidDim {
        /// Expected dimension.
        expected: usize,
        /// Actual length observed.
        actual: usize,
    },

    /// The store was used (`encode`/`decode`/`compute`) before a successful `train`.
    #[error("vector store used before train")]
    NotTrained,

    /// `train` was already called successfully; a second call is a distinct
    /// error path only when the caller explicitly asked to retrain — the
    /// default `train` entry point is idempotent (§8 invariant 10) and returns
    /// `Ok(())` instead of this variant.
    #[error("vector store already trained")]
    AlreadyTrained,

    /// Backing allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// A quantizer-level failure (bad dim/subvector split, insufficient training data).
    #[error(transparent)]
    Quantization(#[from] QuantizationError),
}

/// Build-time choice of encoding family (§6 `base_quantization_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingKind {
    /// Raw `f32` passthrough: `code_size = dim * 4`, no quantization error.
    Flat,
    /// Scalar quantization to 8 bits/dim with a global min-max affine.
    Sq8,
    /// Product quantization: `code_size = num_subvectors` bytes.
    Pq {
        /// Number of sub-vectors `dim` is split into; must divide `dim` evenly.
        num_subvectors: usize,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
enum Calibration {
    #[default]
    None,
    Sq8(ScalarQuantizer),
    Pq(ProductQuantizer),
}

/// An opaque, short-lived object caching query-specific precomputation,
/// produced by [`VectorStore::make_query`] and consumed by [`VectorStore::compute`].
pub enum QueryComputer {
    /// Raw query vector, compared directly against decoded `f32` codes.
    Raw(Vec<f32>),
    /// Raw query vector, compared against SQ8 codes via dequantization.
    Sq8(Vec<f32>),
    /// Precomputed `num_subvectors x 256` asymmetric distance table.
    Pq(PqComputer),
}

/// Holds per-`InnerId` encoded vector codes and answers distance queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStore {
    dim: usize,
    metric: MetricKind,
    kind: EncodingKind,
    calibration: Calibration,
    trained: bool,
    codes: Vec<u8>,
    count: usize,
    #[serde(skip, default = "system_allocator")]
    allocator: AllocatorHandle,
}

impl VectorStore {
    /// Construct an untrained store for `dim`-dimensional vectors under `metric`,
    /// using the given encoding family, backed by the default system allocator.
    #[must_use]
    pub fn new(dim: usize, metric: MetricKind, kind: EncodingKind) -> Self {
        Self::with_allocator(dim, metric, kind, system_allocator())
    }

    /// Construct an untrained store whose `codes` buffer grows through `allocator`
    /// (§4.A) instead of going straight to the global allocator.
    #[must_use]
    pub fn with_allocator(dim: usize, metric: MetricKind, kind: EncodingKind, allocator: AllocatorHandle) -> Self {
        Self {
            dim,
            metric,
            kind,
            calibration: Calibration::None,
            trained: false,
            codes: Vec::new(),
            count: 0,
            allocator,
        }
    }

    /// Grow `codes`'s capacity by at least `additional` bytes through the
    /// configured allocator, preserving existing content.
    fn reserve_codes(&mut self, additional: usize) -> Result<(), StorageError> {
        let needed = self.codes.len() + additional;
        if self.codes.capacity() >= needed {
            return Ok(());
        }
        let new_cap = needed.max(self.codes.capacity().saturating_mul(2)).max(64);
        let mut grown =
            alloc_vec(self.allocator.as_ref(), new_cap).map_err(|_| StorageError::OutOfMemory)?;
        grown[..self.codes.len()].copy_from_slice(&self.codes);
        grown.truncate(self.codes.len());
        self.codes = grown;
        Ok(())
    }

    /// Configured vector dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Configured distance metric.
    #[must_use]
    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    /// Number of vectors stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no vectors have been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes per encoded code for the configured encoding family.
    #[must_use]
    pub fn code_size(&self) -> usize {
        match self.kind {
            EncodingKind::Flat => self.dim * std::mem::size_of::<f32>(),
            EncodingKind::Sq8 => self.dim,
            EncodingKind::Pq { num_subvectors } => num_subvectors,
        }
    }

    /// Bytes occupied by the precomputed per-query structure [`Self::make_query`]
    /// builds — distinct from `code_size`, which is the footprint of a *stored*
    /// code. Flat and SQ8 keep the raw `f32` query around for asymmetric
    /// comparison against decoded codes; PQ instead builds an `num_subvectors x
    /// CODEBOOK_SIZE` distance table.
    #[must_use]
    pub fn query_code_size(&self) -> usize {
        match self.kind {
            EncodingKind::Flat | EncodingKind::Sq8 => self.dim * std::mem::size_of::<f32>(),
            EncodingKind::Pq { num_subvectors } => {
                num_subvectors
                    * crate::quantization::pq::CODEBOOK_SIZE
                    * std::mem::size_of::<f32>()
            }
        }
    }

    /// Derive calibration data from `samples`. Idempotent after the first
    /// successful call (§8 invariant 10): a second call is a no-op `Ok(())`.
    pub fn train(&mut self, samples: &[&[f32]]) -> Result<(), StorageError> {
        if self.trained {
            return Ok(());
        }
        for (i, s) in samples.iter().enumerate() {
            if s.len() != self.dim {
                return Err(StorageError::InvalidDim {
                    expected: self.dim,
                    actual: s.len(),
                });
            }
            let _ = i;
        }
        self.calibration = match self.kind {
            EncodingKind::Flat => Calibration::None,
            EncodingKind::Sq8 => Calibration::Sq8(ScalarQuantizer::train(samples)),
            EncodingKind::Pq { num_subvectors } => Calibration::Pq(ProductQuantizer::train(
                samples,
                self.dim,
                num_subvectors,
                self.metric,
                0x5eed,
            )?),
        };
        self.trained = true;
        Ok(())
    }

    fn require_trained(&self) -> Result<(), StorageError> {
        if self.trained {
            Ok(())
        } else {
            Err(StorageError::NotTrained)
        }
    }

    fn require_dim(&self, vec: &[f32]) -> Result<(), StorageError> {
        if vec.len() != self.dim {
            return Err(StorageError::InvalidDim {
                expected: self.dim,
                actual: vec.len(),
            });
        }
        Ok(())
    }

    /// Encode one vector into `code_size` bytes.
    pub fn encode_one(&self, vec: &[f32]) -> Result<Vec<u8>, StorageError> {
        self.require_trained()?;
        self.require_dim(vec)?;
        Ok(match (&self.kind, &self.calibration) {
            (EncodingKind::Flat, _) => {
                let mut bytes = Vec::with_capacity(vec.len() * 4);
                vec.iter().for_each(|v| bytes.extend_from_slice(&v.to_le_bytes()));
                bytes
            }
            (EncodingKind::Sq8, Calibration::Sq8(q)) => q.quantize(vec),
            (EncodingKind::Pq { .. }, Calibration::Pq(pq)) => pq.encode(vec)?,
            _ => return Err(StorageError::NotTrained),
        })
    }

    /// Encode a batch of vectors; fails on the first invalid entry.
    pub fn encode_batch(&self, vecs: &[&[f32]]) -> Result<Vec<Vec<u8>>, StorageError> {
        vecs.iter().map(|v| self.encode_one(v)).collect()
    }

    /// Decode a code back into an (approximate) `f32` vector.
    #[must_use]
    pub fn decode_one(&self, code: &[u8]) -> Vec<f32> {
        match (&self.kind, &self.calibration) {
            (EncodingKind::Flat, _) => code
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            (EncodingKind::Sq8, Calibration::Sq8(q)) => q.dequantize(code),
            (EncodingKind::Pq { .. }, Calibration::Pq(pq)) => pq.decode(code),
            _ => vec![0.0; self.dim],
        }
    }

    /// Encode and append `vec`, returning its newly assigned `InnerId`.
    pub fn push(&mut self, vec: &[f32]) -> Result<InnerId, StorageError> {
        let code = self.encode_one(vec)?;
        self.push_code(&code)
    }

    /// Append a pre-encoded code (already `code_size` bytes), returning its `InnerId`.
    pub fn push_code(&mut self, code: &[u8]) -> Result<InnerId, StorageError> {
        if code.len() != self.code_size() {
            return Err(StorageError::InvalidDim {
                expected: self.code_size(),
                actual: code.len(),
            });
        }
        self.reserve_codes(code.len())?;
        self.codes.extend_from_slice(code);
        let id = self.count as InnerId;
        self.count += 1;
        Ok(id)
    }

    /// Borrow the raw code bytes for `id`.
    #[must_use]
    pub fn code_at(&self, id: InnerId) -> &[u8] {
        let size = self.code_size();
        let start = id as usize * size;
        &self.codes[start..start + size]
    }

    /// Distance between two stored vectors.
    #[must_use]
    pub fn compute_pair(&self, i: InnerId, j: InnerId) -> f32 {
        match (&self.kind, &self.calibration) {
            (EncodingKind::Pq { .. }, Calibration::Pq(pq)) => {
                pq.code_distance(self.code_at(i), self.code_at(j))
            }
            _ => {
                let a = self.decode_one(self.code_at(i));
                let b = self.decode_one(self.code_at(j));
                self.metric.distance(&a, &b)
            }
        }
    }

    /// Cache query-specific precomputation for repeated `compute` calls.
    pub fn make_query(&self, query: &[f32]) -> Result<QueryComputer, StorageError> {
        self.require_trained()?;
        self.require_dim(query)?;
        Ok(match (&self.kind, &self.calibration) {
            (EncodingKind::Flat, _) => QueryComputer::Raw(query.to_vec()),
            (EncodingKind::Sq8, _) => QueryComputer::Sq8(query.to_vec()),
            (EncodingKind::Pq { .. }, Calibration::Pq(pq)) => {
                QueryComputer::Pq(pq.make_query(query))
            }
            _ => return Err(StorageError::NotTrained),
        })
    }

    /// Distance from the cached query to each listed id, appended to `out`.
    pub fn compute(&self, computer: &QueryComputer, ids: &[InnerId], out: &mut Vec<f32>) {
        out.clear();
        out.reserve(ids.len());
        match computer {
            QueryComputer::Raw(q) => {
                for &id in ids {
                    let v = self.decode_one(self.code_at(id));
                    out.push(self.metric.distance(q, &v));
                }
            }
            QueryComputer::Sq8(q) => {
                for &id in ids {
                    let v = self.decode_one(self.code_at(id));
                    out.push(self.metric.distance(q, &v));
                }
            }
            QueryComputer::Pq(computer) => {
                for &id in ids {
                    out.push(computer.distance(self.code_at(id)));
                }
            }
        }
    }

    /// Approximate memory footprint in bytes, used by `get_stats`'s `memory_bytes`.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.codes.len()
    }

    /// Distance from the cached query to a single id, without the batch buffer.
    #[must_use]
    pub fn compute_one(&self, computer: &QueryComputer, id: InnerId) -> f32 {
        match computer {
            QueryComputer::Raw(q) | QueryComputer::Sq8(q) => {
                let v = self.decode_one(self.code_at(id));
                self.metric.distance(q, &v)
            }
            QueryComputer::Pq(computer) => computer.distance(self.code_at(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vecs(dim: usize, n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..dim).map(|d| (i * 7 + d) as f32 * 0.1).collect())
            .collect()
    }

    #[test]
    fn flat_roundtrip_is_exact() {
        let mut store = VectorStore::new(4, MetricKind::L2, EncodingKind::Flat);
        store.train(&[]).unwrap();
        let id = store.push(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let decoded = store.decode_one(store.code_at(id));
        assert_eq!(decoded, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn encode_before_train_fails() {
        let store = VectorStore::new(4, MetricKind::L2, EncodingKind::Sq8);
        let err = store.encode_one(&[0.0; 4]).unwrap_err();
        assert!(matches!(err, StorageError::NotTrained));
    }

    #[test]
    fn train_is_idempotent() {
        let samples = sample_vecs(4, 300);
        let refs: Vec<&[f32]> = samples.iter().map(Vec::as_slice).collect();
        let mut store = VectorStore::new(4, MetricKind::L2, EncodingKind::Sq8);
        store.train(&refs).unwrap();
        // Second call is a no-op success, not an error.
        store.train(&refs).unwrap();
    }

    #[test]
    fn sq8_compute_matches_metric_within_tolerance() {
        let samples = sample_vecs(8, 300);
        let refs: Vec<&[f32]> = samples.iter().map(Vec::as_slice).collect();
        let mut store = VectorStore::new(8, MetricKind::L2, EncodingKind::Sq8);
        store.train(&refs).unwrap();
        let id = store.push(&samples[0]).unwrap();

        let computer = store.make_query(&samples[0]).unwrap();
        let d = store.compute_one(&computer, id);
        assert!(d < 1.0, "self-distance should be small post-quantization");
    }

    #[test]
    fn pq_code_size_is_num_subvectors() {
        let samples = sample_vecs(16, 300);
        let refs: Vec<&[f32]> = samples.iter().map(Vec::as_slice).collect();
        let mut store = VectorStore::new(16, MetricKind::L2, EncodingKind::Pq { num_subvectors: 4 });
        store.train(&refs).unwrap();
        assert_eq!(store.code_size(), 4);
        let id = store.push(&samples[0]).unwrap();
        assert_eq!(store.code_at(id).len(), 4);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut store = VectorStore::new(4, MetricKind::L2, EncodingKind::Flat);
        store.train(&[]).unwrap();
        let err = store.push(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidDim { .. }));
    }

    #[test]
    fn query_code_size_differs_from_code_size_for_pq() {
        let samples = sample_vecs(16, 300);
        let refs: Vec<&[f32]> = samples.iter().map(Vec::as_slice).collect();
        let mut store = VectorStore::new(16, MetricKind::L2, EncodingKind::Pq { num_subvectors: 4 });
        store.train(&refs).unwrap();
        assert_eq!(store.code_size(), 4);
        assert_eq!(
            store.query_code_size(),
            4 * crate::quantization::pq::CODEBOOK_SIZE * std::mem::size_of::<f32>()
        );
    }

    #[test]
    fn query_code_size_matches_code_size_for_flat() {
        let store = VectorStore::new(8, MetricKind::L2, EncodingKind::Flat);
        assert_eq!(store.query_code_size(), store.code_size());
    }
}
