//! # EdgeVec
//!
//! An embeddable approximate-nearest-neighbor vector index: a hierarchical
//! (HNSW-style) proximity graph over a flat or quantized vector store,
//! searched with a greedy beam search and built with an α/τ edge-selection
//! heuristic that keeps per-vertex degree bounded while preserving
//! navigability.
//!
//! ## Example
//!
//! ```rust
//! use edgevec::graph::GraphStorageKind;
//! use edgevec::metric::MetricKind;
//! use edgevec::params::{BuildParams, HeuristicKind, QuantizationKind, SearchParams};
//! use edgevec::hnsw::HierarchicalIndex;
//!
//! let params = BuildParams {
//!     dim: 4,
//!     metric_type: MetricKind::L2,
//!     max_degree: 16,
//!     ef_construction: 100,
//!     base_quantization_type: QuantizationKind::Flat,
//!     use_reorder: false,
//!     graph_storage_type: GraphStorageKind::Flat,
//!     heuristic: HeuristicKind::Alpha(1.0),
//!     seed: 0x5eed,
//! };
//! let index = HierarchicalIndex::new(params);
//! index.train(&[]).expect("train");
//!
//! let id = index.add(1, &[0.1, 0.2, 0.3, 0.4]).expect("insert");
//! let results = index
//!     .knn_search(&[0.1, 0.2, 0.3, 0.4], 1, SearchParams::new(10))
//!     .expect("search");
//!
//! assert_eq!(results[0].id, id.inner_id);
//! ```
//!
//! ## Serialization
//!
//! ```rust,no_run
//! use edgevec::hnsw::HierarchicalIndex;
//! use edgevec::persistence::{read_index, write_index, MemoryBackend};
//! # use edgevec::graph::GraphStorageKind;
//! # use edgevec::metric::MetricKind;
//! # use edgevec::params::{BuildParams, HeuristicKind, QuantizationKind};
//! # let params = BuildParams { dim: 4, metric_type: MetricKind::L2, max_degree: 16, ef_construction: 100, base_quantization_type: QuantizationKind::Flat, use_reorder: false, graph_storage_type: GraphStorageKind::Flat, heuristic: HeuristicKind::Alpha(1.0), seed: 1 };
//!
//! let index = HierarchicalIndex::new(params.clone());
//! index.train(&[]).unwrap();
//!
//! let mut backend = MemoryBackend::new();
//! write_index(&index, &mut backend).expect("save");
//!
//! let mut reader = MemoryBackend::from_bytes(backend.into_inner());
//! let restored = read_index(&mut reader, &params).expect("load");
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

/// Allocator contract (§4.A).
pub mod allocator;
/// Batch insertion helpers on top of [`index::Index`].
pub mod batch;
/// Unified error handling.
pub mod error;
/// Minimal filter hook for the beam searcher (§4.G).
pub mod filter;
/// Graph store: per-layer neighbor lists, flat and Elias-Fano-compressed.
pub mod graph;
/// Edge-selection heuristic (α and τ variants).
pub mod heuristic;
/// Hierarchical (HNSW-style) index: build/insert/search orchestration.
pub mod hnsw;
/// Top-level `Index` trait facade and `create_index`/`deserialize` factories.
pub mod index;
/// Label table: the `Label <-> InnerId` bijection.
pub mod label;
/// Distance metrics.
pub mod metric;
/// Build/search parameter bags.
pub mod params;
/// Serialization: file header, length-prefixed sections, CRC32 footer.
pub mod persistence;
/// Quantization support (scalar and product quantization).
pub mod quantization;
/// SIMD capability detection and runtime dispatch.
pub mod simd;
/// Diagnostic stats snapshot.
pub mod stats;
/// Vector store: per-vector codes and distance computation.
pub mod storage;
/// Concurrency discipline: topology lock and per-vertex lock stripe.
pub mod concurrency;
/// Per-search visited-list pool.
pub mod visited;

pub use error::{BatchError, Error};
pub use hnsw::HierarchicalIndex;
pub use index::{create_index, deserialize, Dataset, Index};

/// The crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub fn version() -> &'static str {
    VERSION
}
