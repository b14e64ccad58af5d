//! Hierarchical index (§4.I): the HNSW build/search orchestration tying
//! together the label table, vector store, per-layer graph stores, and the
//! beam searcher and edge-selection heuristic.

/// Insertion algorithm.
pub mod insert;
/// Beam search algorithm.
pub mod search;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::concurrency::{LockStripe, Topology};
use crate::graph::GraphStore;
use crate::label::{Label, LabelTable};
use crate::params::{BuildParams, InsertOutcome, QuantizationKind, SearchParams};
use crate::stats::IndexStats;
use crate::storage::{EncodingKind, VectorStore};
use crate::visited::VisitedListPool;
use crate::Error;

pub use search::{Candidate, InnerSearchParam, SearchMode};

/// Distance below which a candidate encountered during insert is reported as
/// a likely duplicate (§4.I "Duplicate detection"). Independent of
/// [`crate::params::SearchParams::range_epsilon`], which serves a different purpose.
pub const DUPLICATE_EPSILON: f32 = 1e-5;

fn encoding_kind_of(q: QuantizationKind) -> EncodingKind {
    match q {
        QuantizationKind::Flat => EncodingKind::Flat,
        QuantizationKind::Sq8 => EncodingKind::Sq8,
        QuantizationKind::Pq { num_subvectors } => EncodingKind::Pq { num_subvectors },
    }
}

fn degree_for_layer(params: &BuildParams, layer: usize) -> usize {
    if layer == 0 {
        params.max_degree
    } else {
        params.upper_layer_degree()
    }
}

fn ensure_layers(graph: &mut Vec<GraphStore>, up_to: u16, params: &BuildParams) {
    while graph.len() <= up_to as usize {
        let layer = graph.len();
        graph.push(GraphStore::new(params.graph_storage_type, degree_for_layer(params, layer)));
    }
}

/// A hierarchical (HNSW-style) proximity graph index over `f32` vectors.
pub struct HierarchicalIndex {
    params: BuildParams,
    topology: Topology,
    labels: RwLock<LabelTable>,
    store: RwLock<VectorStore>,
    graph: RwLock<Vec<GraphStore>>,
    vertex_locks: LockStripe,
    visited_pool: VisitedListPool,
    level_rng: Mutex<ChaCha8Rng>,
}

impl HierarchicalIndex {
    /// Construct an empty, untrained index from `params`.
    #[must_use]
    pub fn new(params: BuildParams) -> Self {
        let store = VectorStore::new(params.dim, params.metric_type, encoding_kind_of(params.base_quantization_type));
        let seed = params.seed;
        log::info!(
            "constructing hnsw index: dim={}, max_degree={}, ef_construction={}",
            params.dim,
            params.max_degree,
            params.ef_construction
        );
        Self {
            params,
            topology: Topology::new(),
            labels: RwLock::new(LabelTable::new()),
            store: RwLock::new(store),
            graph: RwLock::new(Vec::new()),
            vertex_locks: LockStripe::new(),
            visited_pool: VisitedListPool::new(0),
            level_rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// The build parameters this index was constructed with.
    #[must_use]
    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    /// Derive calibration data for the vector store's encoding family.
    /// Idempotent; a second call after a successful train is a no-op.
    pub fn train(&self, samples: &[&[f32]]) -> Result<(), Error> {
        self.store.write().train(samples)?;
        Ok(())
    }

    /// Number of vectors currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.read().len()
    }

    /// True if no vectors have been inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert one `(label, vec)` pair (§4.I "Insert"). See [`insert::add_one`].
    pub fn add(&self, label: Label, vec: &[f32]) -> Result<InsertOutcome, Error> {
        insert::add_one(self, label, vec)
    }

    /// Insert a batch of `(label, vec)` pairs, one at a time, collecting each
    /// outcome; a duplicate label or dimension mismatch on one entry does not
    /// abort the remaining entries (§7 "callable-local failures propagate").
    pub fn add_batch(&self, items: &[(Label, &[f32])]) -> Vec<Result<InsertOutcome, Error>> {
        items.iter().map(|&(label, vec)| self.add(label, vec)).collect()
    }

    /// Find the `topk` nearest neighbors of `query` (§4.I "kNN search").
    pub fn knn_search(&self, query: &[f32], topk: usize, params: SearchParams) -> Result<Vec<Candidate>, Error> {
        insert::knn_search(self, query, topk, params)
    }

    /// Find all neighbors of `query` within `radius` (§4.I "Range search").
    pub fn range_search(&self, query: &[f32], radius: f32, params: SearchParams) -> Result<Vec<Candidate>, Error> {
        insert::range_search(self, query, radius, params)
    }

    /// Resolve an `InnerId` back to its external label.
    #[must_use]
    pub fn get_label(&self, inner_id: u32) -> Option<Label> {
        self.labels.read().get_label(inner_id)
    }

    /// Diagnostic snapshot (§6 "Stats JSON").
    #[must_use]
    pub fn get_stats(&self) -> IndexStats {
        let snap = self.topology.snapshot();
        let store = self.store.read();
        let graph = self.graph.read();
        let graph_bytes: usize = graph.iter().map(GraphStore::memory_bytes).sum();
        IndexStats {
            index_name: "hnsw",
            num_elements: self.labels.read().len(),
            memory_bytes: store.memory_bytes() + graph_bytes,
            entry_point: snap.entry_point.map(|(id, _)| id),
            layer_count: snap.layer_count,
        }
    }

    pub(crate) fn store(&self) -> &RwLock<VectorStore> {
        &self.store
    }

    pub(crate) fn labels(&self) -> &RwLock<LabelTable> {
        &self.labels
    }

    pub(crate) fn graph(&self) -> &RwLock<Vec<GraphStore>> {
        &self.graph
    }

    pub(crate) fn topology(&self) -> &Topology {
        &self.topology
    }

    pub(crate) fn vertex_locks(&self) -> &LockStripe {
        &self.vertex_locks
    }

    pub(crate) fn visited_pool(&self) -> &VisitedListPool {
        &self.visited_pool
    }

    /// Rebuild an index from its deserialized parts (used by
    /// [`crate::persistence::read_index`]).
    #[must_use]
    pub(crate) fn from_parts(
        params: BuildParams,
        labels: LabelTable,
        store: VectorStore,
        graph: Vec<GraphStore>,
        entry_point: Option<(u32, u16)>,
        layer_count: u16,
        seed: u64,
    ) -> Self {
        let index = Self {
            params,
            topology: Topology::new(),
            labels: RwLock::new(labels),
            store: RwLock::new(store),
            graph: RwLock::new(graph),
            vertex_locks: LockStripe::new(),
            visited_pool: VisitedListPool::new(0),
            level_rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        };
        let mut topo = index.topology.write();
        topo.entry_point = entry_point;
        topo.layer_count = layer_count;
        topo.label_count = index.labels.read().len() as u32;
        drop(topo);
        index
    }

    pub(crate) fn sample_level(&self) -> u16 {
        use rand::Rng;
        let mut rng = self.level_rng.lock();
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        (-u.ln() * self.params.level_multiplier()).floor() as u16
    }
}
