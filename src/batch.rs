//! Batch insertion convenience on top of [`crate::index::Index::add`] (§6
//! "Dataset options"): progress callbacks and best-effort partial-success
//! semantics over a plain `(Label, Vec<f32>)` sequence, for hosts that don't
//! want to build a [`crate::index::Dataset`] by hand.
//!
//! Throughput is equivalent to calling `add` in a loop — this trait adds
//! convenience (a single call, progress reporting), not raw speed.

use crate::error::BatchError;
use crate::index::{Dataset, Index};
use crate::label::{InnerId, Label};

/// Extension trait for bulk insertion with progress tracking.
pub trait BatchInsertable {
    /// Insert `vectors` one batch at a time, reporting progress through
    /// `progress_callback` at roughly 10% intervals.
    ///
    /// Best-effort: a per-vector failure (duplicate label, bad dimension) is
    /// recorded in the per-entry error but does not abort the remaining
    /// entries; an empty `vectors` iterator is the one fatal, whole-call error.
    ///
    /// # Errors
    /// Returns [`BatchError::EmptyBatch`] if `vectors` is empty.
    fn batch_insert<I, F>(&self, vectors: I, progress_callback: Option<F>) -> Result<Vec<InnerId>, BatchError>
    where
        I: IntoIterator<Item = (Label, Vec<f32>)>,
        F: FnMut(usize, usize);
}

impl<T: Index + ?Sized> BatchInsertable for T {
    fn batch_insert<I, F>(&self, vectors: I, mut progress_callback: Option<F>) -> Result<Vec<InnerId>, BatchError>
    where
        I: IntoIterator<Item = (Label, Vec<f32>)>,
        F: FnMut(usize, usize),
    {
        let items: Vec<(Label, Vec<f32>)> = vectors.into_iter().collect();
        if items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let dim = items[0].1.len();
        for (offset, (_, v)) in items.iter().enumerate() {
            if v.len() != dim {
                return Err(BatchError::DimensionMismatch {
                    expected: dim,
                    actual: v.len(),
                    offset,
                });
            }
        }

        let total = items.len();
        let ids: Vec<Label> = items.iter().map(|(label, _)| *label).collect();
        let flat: Vec<f32> = items.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        let dataset = Dataset {
            num_elements: total,
            dim,
            ids: &ids,
            float32_vectors: &flat,
        };

        let outcomes = self
            .add(&dataset)
            .map_err(|e| BatchError::InvalidVector {
                offset: 0,
                reason: e.to_string(),
            })?;

        let mut inserted = Vec::with_capacity(total);
        let report_every = (total / 10).max(1);
        for (i, outcome) in outcomes.into_iter().enumerate() {
            if let Ok(inner_id) = outcome {
                inserted.push(inner_id);
            }
            if let Some(cb) = progress_callback.as_mut() {
                if i % report_every == 0 || i + 1 == total {
                    cb(i + 1, total);
                }
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStorageKind;
    use crate::index::create_index;
    use crate::metric::MetricKind;
    use crate::params::{BuildParams, HeuristicKind, QuantizationKind};

    fn params_json(dim: usize) -> String {
        let params = BuildParams {
            dim,
            metric_type: MetricKind::L2,
            max_degree: 8,
            ef_construction: 32,
            base_quantization_type: QuantizationKind::Flat,
            use_reorder: false,
            graph_storage_type: GraphStorageKind::Flat,
            heuristic: HeuristicKind::Alpha(1.0),
            seed: 5,
        };
        serde_json::to_string(&params).unwrap()
    }

    #[test]
    fn empty_batch_is_rejected() {
        let index = create_index("hnsw", &params_json(4)).unwrap();
        let err = index.batch_insert(Vec::<(Label, Vec<f32>)>::new(), None::<fn(usize, usize)>).unwrap_err();
        assert_eq!(err, BatchError::EmptyBatch);
    }

    #[test]
    fn batch_insert_reports_progress_and_returns_ids() {
        let index = create_index("hnsw", &params_json(4)).unwrap();
        let vectors: Vec<(Label, Vec<f32>)> = (0..20).map(|i| (i as u64, vec![i as f32; 4])).collect();

        let mut calls = 0;
        let ids = index
            .batch_insert(
                vectors,
                Some(|_inserted: usize, _total: usize| {
                    calls += 1;
                }),
            )
            .unwrap();

        assert_eq!(ids.len(), 20);
        assert!(calls > 0);
    }

    #[test]
    fn dimension_mismatch_mid_batch_rejected() {
        let index = create_index("hnsw", &params_json(4)).unwrap();
        let vectors: Vec<(Label, Vec<f32>)> = vec![(1, vec![0.0; 4]), (2, vec![0.0; 3])];
        let err = index.batch_insert(vectors, None::<fn(usize, usize)>).unwrap_err();
        assert!(matches!(err, BatchError::DimensionMismatch { .. }));
    }
}
