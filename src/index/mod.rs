//! Top-level `Index` trait facade (§6 "Library surface").
//!
//! Hosts go through three entry points: [`create_index`] to build a fresh
//! index from a `kind` string and a JSON (or native) parameter bag,
//! [`deserialize`] to restore one from a byte stream, and the [`Index`]
//! trait itself for `add`/`knn_search`/`range_search`/`serialize`/`get_stats`.
//! Only `kind = "hnsw"` is implemented; `"hgraph"` is reserved so this trait
//! boundary doesn't need to move when a second backend arrives.

use std::io::{Read, Write};

use crate::hnsw::{Candidate, HierarchicalIndex};
use crate::label::{InnerId, Label};
use crate::params::{BuildParams, SearchParams};
use crate::persistence;
use crate::stats::IndexStats;
use crate::Error;

/// A batch of vectors offered to `add` in one call (§6 "Dataset options").
pub struct Dataset<'a> {
    /// Number of vectors in this batch.
    pub num_elements: usize,
    /// Vector dimension; must equal the index's configured `dim`.
    pub dim: usize,
    /// External labels, one per vector.
    pub ids: &'a [Label],
    /// Row-major `num_elements * dim` floats.
    pub float32_vectors: &'a [f32],
}

impl<'a> Dataset<'a> {
    /// Borrow the `i`-th vector's slice out of `float32_vectors`.
    fn vector(&self, i: usize) -> &'a [f32] {
        &self.float32_vectors[i * self.dim..(i + 1) * self.dim]
    }
}

/// Common surface implemented by every index backend (§6).
pub trait Index {
    /// Insert a batch of vectors, returning one outcome per entry in order.
    fn add(&self, dataset: &Dataset<'_>) -> Result<Vec<Result<InnerId, Error>>, Error>;

    /// k-nearest-neighbor search.
    fn knn_search(&self, query: &[f32], topk: usize, params: SearchParams) -> Result<Vec<Candidate>, Error>;

    /// Radius range search.
    fn range_search(&self, query: &[f32], radius: f32, params: SearchParams) -> Result<Vec<Candidate>, Error>;

    /// Write a full snapshot to `writer` (§4.J).
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), Error>;

    /// Diagnostic stats (§6 "Stats JSON").
    fn get_stats(&self) -> IndexStats;
}

impl Index for HierarchicalIndex {
    fn add(&self, dataset: &Dataset<'_>) -> Result<Vec<Result<InnerId, Error>>, Error> {
        if dataset.num_elements == 0 {
            return Err(Error::InvalidArgument("dataset has zero elements".to_string()));
        }
        if dataset.dim != self.params().dim {
            return Err(Error::InvalidArgument(format!(
                "dataset dim {} does not match index dim {}",
                dataset.dim,
                self.params().dim
            )));
        }
        if dataset.ids.len() != dataset.num_elements {
            return Err(Error::InvalidArgument(
                "ids length does not match num_elements".to_string(),
            ));
        }

        // Idempotent (§8 invariant 10): the first dataset offered through this
        // facade also doubles as the vector store's calibration sample.
        let samples: Vec<&[f32]> = (0..dataset.num_elements).map(|i| dataset.vector(i)).collect();
        self.train(&samples)?;

        Ok((0..dataset.num_elements)
            .map(|i| self.add(dataset.ids[i], dataset.vector(i)).map(|o| o.inner_id))
            .collect())
    }

    fn knn_search(&self, query: &[f32], topk: usize, params: SearchParams) -> Result<Vec<Candidate>, Error> {
        HierarchicalIndex::knn_search(self, query, topk, params)
    }

    fn range_search(&self, query: &[f32], radius: f32, params: SearchParams) -> Result<Vec<Candidate>, Error> {
        HierarchicalIndex::range_search(self, query, radius, params)
    }

    fn serialize(&self, writer: &mut dyn Write) -> Result<(), Error> {
        persistence::write_index(self, writer).map_err(Error::from)
    }

    fn get_stats(&self) -> IndexStats {
        HierarchicalIndex::get_stats(self)
    }
}

/// Build a fresh index of the given `kind` from a JSON parameter bag.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if `kind` is unrecognized or `params_json`
/// fails to deserialize into [`BuildParams`].
pub fn create_index(kind: &str, params_json: &str) -> Result<Box<dyn Index>, Error> {
    match kind {
        "hnsw" => {
            let params: BuildParams = serde_json::from_str(params_json)
                .map_err(|e| Error::InvalidArgument(format!("invalid build params: {e}")))?;
            params.validate()?;
            Ok(Box::new(HierarchicalIndex::new(params)))
        }
        "hgraph" => Err(Error::InvalidArgument("hgraph backend not yet implemented".to_string())),
        other => Err(Error::InvalidArgument(format!("unknown index kind: {other}"))),
    }
}

/// Restore an index of the given `kind` from `reader`, validating its stored
/// parameters against `params_json` (§6 "factory.deserialize").
///
/// # Errors
/// Returns [`Error::IncompatibleIndex`] if the stored parameter tree does not
/// match `params_json`, or a read/corruption error from the persistence layer.
pub fn deserialize(kind: &str, reader: &mut dyn Read, params_json: &str) -> Result<Box<dyn Index>, Error> {
    match kind {
        "hnsw" => {
            let expected: BuildParams = serde_json::from_str(params_json)
                .map_err(|e| Error::InvalidArgument(format!("invalid build params: {e}")))?;
            expected.validate()?;
            let index = persistence::read_index(reader, &expected)?;
            Ok(Box::new(index))
        }
        "hgraph" => Err(Error::InvalidArgument("hgraph backend not yet implemented".to_string())),
        other => Err(Error::InvalidArgument(format!("unknown index kind: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStorageKind;
    use crate::metric::MetricKind;
    use crate::params::{HeuristicKind, QuantizationKind};
    use crate::persistence::MemoryBackend;

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
            seed: 11,
        };
        serde_json::to_string(&params).unwrap()
    }

    #[test]
    fn create_index_rejects_unknown_kind() {
        let err = create_index("bogus", &params_json(4)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn dataset_add_then_search_round_trips_through_trait_object() {
        let index = create_index("hnsw", &params_json(4)).unwrap();
        let ids = [1u64, 2, 3];
        let vectors = [0.0f32, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let dataset = Dataset {
            num_elements: 3,
            dim: 4,
            ids: &ids,
            float32_vectors: &vectors,
        };
        let outcomes = index.add(&dataset).unwrap();
        assert!(outcomes.iter().all(Result::is_ok));

        let results = index.knn_search(&[0.1, 0.1, 0.1, 0.1], 1, SearchParams::new(10)).unwrap();
        assert_eq!(results[0].id, 0);

        let stats = index.get_stats();
        assert_eq!(stats.num_elements, 3);
    }

    #[test]
    fn serialize_then_deserialize_via_trait_facade() {
        let index = create_index("hnsw", &params_json(4)).unwrap();
        let ids = [1u64, 2];
        let vectors = [0.0f32, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let dataset = Dataset {
            num_elements: 2,
            dim: 4,
            ids: &ids,
            float32_vectors: &vectors,
        };
        index.add(&dataset).unwrap();

        let mut backend = MemoryBackend::new();
        index.serialize(&mut backend).unwrap();

        let mut reader = MemoryBackend::from_bytes(backend.into_inner());
        let restored = deserialize("hnsw", &mut reader, &params_json(4)).unwrap();
        assert_eq!(restored.get_stats().num_elements, 2);
    }
}
