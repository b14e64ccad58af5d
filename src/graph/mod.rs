//! Graph store (§4.E): for each `InnerId`, an ordered neighbor list bounded by
//! `max_degree`. Two back-ends exist as a tagged variant per layer — flat
//! fixed-size records, or Elias-Fano compressed — selected at construction
//! time by `graph_storage_type` (§6). Neither is a trait object: the per-layer
//! store picks one concrete representation and the hot path (`get_neighbors`)
//! never goes through a vtable.

/// Elias-Fano encoding used by the compressed back-end.
pub mod elias_fano;

use elias_fano::EliasFano;
use thiserror::Error;

use crate::label::InnerId;

/// Errors raised by graph-store neighbor mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// `set_neighbors` was given more ids than `max_degree` allows.
    #[error("degree overflow: attempted {attempted}, max {max}")]
    DegreeOverflow {
        /// Number of neighbors the caller tried to store.
        attempted: usize,
        /// Configured maximum degree.
        max: usize,
    },

    /// A vertex id was referenced outside the store's current capacity.
    #[error("inner id {id} out of range (capacity {capacity})")]
    OutOfRange {
        /// The out-of-range id.
        id: InnerId,
        /// The store's current capacity.
        capacity: usize,
    },

    /// `max_degree` exceeds what the Elias-Fano compressed back-end can hold
    /// per vertex (capped at [`elias_fano::MAX_ELEMENTS`]).
    #[error("compressed graph storage cannot hold degree {attempted}, limit {limit}")]
    CompressedDegreeTooLarge {
        /// The configured or attempted degree.
        attempted: usize,
        /// The compressed back-end's element cap.
        limit: usize,
    },
}

/// Build-time choice of per-layer neighbor-list representation (§6 `graph_storage_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStorageKind {
    /// Fixed-size record per vertex: length prefix + contiguous neighbor array.
    Flat,
    /// Elias-Fano compressed sorted neighbor lists, capped at 255 elements.
    Compressed,
}

/// One layer's worth of neighbor lists for every vertex that participates in it.
///
/// `set_neighbors`/`get_neighbors` are the hot-path operations the beam
/// searcher and mutual-connect call; everything else is bookkeeping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum GraphStore {
    /// Flat back-end: `Vec<Vec<InnerId>>`, one entry per vertex, capacity-bounded.
    Flat {
        /// Per-vertex neighbor lists, length <= `max_degree`.
        neighbors: Vec<Vec<InnerId>>,
        /// Maximum neighbors per vertex in this layer.
        max_degree: usize,
    },
    /// Compressed back-end: one Elias-Fano code per vertex.
    Compressed {
        /// Per-vertex Elias-Fano encodings.
        neighbors: Vec<EliasFano>,
        /// Maximum neighbors per vertex in this layer.
        max_degree: usize,
    },
}

impl GraphStore {
    /// Build an empty store of the given kind and degree cap.
    ///
    /// Callers that accept a caller-supplied `max_degree` alongside
    /// `GraphStorageKind::Compressed` must validate it against
    /// [`elias_fano::MAX_ELEMENTS`] first (see `BuildParams::validate`) —
    /// this constructor trusts its caller and does not re-check, since by
    /// the time a layer store is built the degree budget has already been
    /// through that gate.
    #[must_use]
    pub fn new(kind: GraphStorageKind, max_degree: usize) -> Self {
        match kind {
            GraphStorageKind::Flat => GraphStore::Flat {
                neighbors: Vec::new(),
                max_degree,
            },
            GraphStorageKind::Compressed => GraphStore::Compressed {
                neighbors: Vec::new(),
                max_degree,
            },
        }
    }

    /// Maximum neighbors any vertex in this layer may have.
    #[must_use]
    pub fn max_degree(&self) -> usize {
        match self {
            GraphStore::Flat { max_degree, .. } | GraphStore::Compressed { max_degree, .. } => {
                *max_degree
            }
        }
    }

    /// Number of vertex slots currently allocated.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match self {
            GraphStore::Flat { neighbors, .. } => neighbors.len(),
            GraphStore::Compressed { neighbors, .. } => neighbors.len(),
        }
    }

    /// Grow the store to hold at least `n` vertex slots (new slots start empty).
    pub fn resize(&mut self, n: usize) {
        match self {
            GraphStore::Flat { neighbors, .. } => {
                if neighbors.len() < n {
                    neighbors.resize(n, Vec::new());
                }
            }
            GraphStore::Compressed { neighbors, .. } => {
                if neighbors.len() < n {
                    neighbors.resize(n, EliasFano::default());
                }
            }
        }
    }

    /// Best-effort cache-warming hint; flat storage has nothing meaningful to
    /// do beyond a normal slice access, so this is a no-op kept for interface
    /// symmetry with a future back-end that could prefetch from disk.
    pub fn prefetch(&self, _id: InnerId) {}

    /// Replace vertex `i`'s neighbor list. The list is stored as given for the
    /// flat back-end; the compressed back-end sorts it before encoding (§4.E
    /// compressed-back-end invariant).
    pub fn set_neighbors(&mut self, i: InnerId, ids: &[InnerId]) -> Result<(), GraphError> {
        let max_degree = self.max_degree();
        if ids.len() > max_degree {
            return Err(GraphError::DegreeOverflow {
                attempted: ids.len(),
                max: max_degree,
            });
        }
        let idx = i as usize;
        if idx >= self.capacity() {
            self.resize(idx + 1);
        }
        match self {
            GraphStore::Flat { neighbors, .. } => {
                neighbors[idx] = ids.to_vec();
            }
            GraphStore::Compressed { neighbors, .. } => {
                let mut sorted = ids.to_vec();
                sorted.sort_unstable();
                let max_value = sorted.last().copied().unwrap_or(0);
                neighbors[idx] = EliasFano::encode(&sorted, max_value);
            }
        }
        Ok(())
    }

    /// Fetch vertex `i`'s neighbor list. Constant-time view for flat storage,
    /// decoded copy for compressed storage.
    #[must_use]
    pub fn get_neighbors(&self, i: InnerId) -> Vec<InnerId> {
        let idx = i as usize;
        match self {
            GraphStore::Flat { neighbors, .. } => neighbors.get(idx).cloned().unwrap_or_default(),
            GraphStore::Compressed { neighbors, .. } => neighbors
                .get(idx)
                .map(EliasFano::decode)
                .unwrap_or_default(),
        }
    }

    /// Approximate memory footprint in bytes, used by `get_stats`'s `memory_bytes`.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        match self {
            GraphStore::Flat { neighbors, .. } => neighbors
                .iter()
                .map(|v| v.len() * std::mem::size_of::<InnerId>() + std::mem::size_of::<Vec<InnerId>>())
                .sum(),
            GraphStore::Compressed { neighbors, .. } => {
                neighbors.iter().map(EliasFano::size_in_bytes).sum()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_set_get_roundtrip() {
        let mut g = GraphStore::new(GraphStorageKind::Flat, 4);
        g.resize(3);
        g.set_neighbors(0, &[1, 2]).unwrap();
        assert_eq!(g.get_neighbors(0), vec![1, 2]);
    }

    #[test]
    fn degree_overflow_rejected() {
        let mut g = GraphStore::new(GraphStorageKind::Flat, 2);
        let err = g.set_neighbors(0, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, GraphError::DegreeOverflow { attempted: 3, max: 2 }));
    }

    #[test]
    fn compressed_sorts_and_decodes_exactly() {
        let mut g = GraphStore::new(GraphStorageKind::Compressed, 8);
        g.set_neighbors(0, &[5, 1, 3]).unwrap();
        assert_eq!(g.get_neighbors(0), vec![1, 3, 5]);
    }

    #[test]
    fn flat_and_compressed_produce_same_set_for_same_inserts() {
        let inserted = [9u32, 2, 4, 7];
        let mut flat = GraphStore::new(GraphStorageKind::Flat, 8);
        let mut compressed = GraphStore::new(GraphStorageKind::Compressed, 8);
        flat.set_neighbors(0, &inserted).unwrap();
        compressed.set_neighbors(0, &inserted).unwrap();

        let mut flat_sorted = flat.get_neighbors(0);
        flat_sorted.sort_unstable();
        let mut expected = inserted.to_vec();
        expected.sort_unstable();
        assert_eq!(flat_sorted, expected);
        assert_eq!(compressed.get_neighbors(0), expected);
    }

    #[test]
    fn resize_never_shrinks_existing_entries() {
        let mut g = GraphStore::new(GraphStorageKind::Flat, 4);
        g.set_neighbors(0, &[1]).unwrap();
        g.resize(5);
        assert_eq!(g.get_neighbors(0), vec![1]);
    }
}
