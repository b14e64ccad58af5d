//! Build and search parameter bags (§6), serde-JSON round-trippable so a host
//! can pass either a constructed struct or a `params_json` string through
//! [`crate::index`]'s `create_index`/`knn_search`/`range_search` entry points.

use serde::{Deserialize, Serialize};

use crate::graph::elias_fano;
use crate::graph::{GraphError, GraphStorageKind};
use crate::label::InnerId;
use crate::metric::MetricKind;

/// Which vector encoding family to build with (§6 `base_quantization_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QuantizationKind {
    /// Raw `f32`, no quantization error.
    Flat,
    /// Scalar quantization to 8 bits/dim.
    Sq8,
    /// Product quantization with the given sub-vector count.
    Pq {
        /// Number of sub-vectors `dim` is split into.
        num_subvectors: usize,
    },
}

/// Which edge-selection heuristic variant to build with (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "variant", content = "value")]
pub enum HeuristicKind {
    /// Robust-pruning variant with the given `alpha`.
    Alpha(f32),
    /// tau-MG variant with the given `tau`.
    Tau(f32),
}

impl Default for HeuristicKind {
    fn default() -> Self {
        HeuristicKind::Alpha(1.0)
    }
}

/// Build-time parameters for a hierarchical index (§6 "Build parameters").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildParams {
    /// Vector dimension.
    pub dim: usize,
    /// Distance metric.
    pub metric_type: MetricKind,
    /// Base-layer (layer 0) maximum degree; upper layers use `max_degree / 2`.
    pub max_degree: usize,
    /// Candidate-list size used while building (§4.I step 5).
    pub ef_construction: usize,
    /// Vector-store encoding family.
    pub base_quantization_type: QuantizationKind,
    /// Whether a higher-precision re-ranking pass runs after the coarse search.
    pub use_reorder: bool,
    /// Per-layer neighbor-list representation.
    pub graph_storage_type: GraphStorageKind,
    /// Edge-selection heuristic and its parameter.
    #[serde(default)]
    pub heuristic: HeuristicKind,
    /// RNG seed for level sampling and (if applicable) PQ codebook training.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    0x5eed
}

impl BuildParams {
    /// `m_L = 1 / ln(max_degree)`, the level-sampling exponential-decay parameter (§4.I).
    #[must_use]
    pub fn level_multiplier(&self) -> f64 {
        1.0 / (self.max_degree as f64).ln()
    }

    /// Upper-layer (non-zero) degree budget, half of the base-layer budget.
    #[must_use]
    pub fn upper_layer_degree(&self) -> usize {
        (self.max_degree / 2).max(1)
    }

    /// The JSON parameter tree stored in the §4.J serialization footer and
    /// compared on deserialization to reject an `IncompatibleIndex`.
    ///
    /// # Panics
    /// Never: `BuildParams` always serializes successfully.
    #[must_use]
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("BuildParams always serializes")
    }

    /// Reject parameter combinations that would panic deeper in the stack
    /// instead of failing construction cleanly.
    ///
    /// # Errors
    /// Returns [`GraphError::CompressedDegreeTooLarge`] if `graph_storage_type`
    /// is `Compressed` and `max_degree` exceeds [`elias_fano::MAX_ELEMENTS`] —
    /// the Elias-Fano back-end's per-vertex code is capped at 255 neighbors.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.graph_storage_type == GraphStorageKind::Compressed
            && self.max_degree > elias_fano::MAX_ELEMENTS
        {
            return Err(GraphError::CompressedDegreeTooLarge {
                attempted: self.max_degree,
                limit: elias_fano::MAX_ELEMENTS,
            });
        }
        Ok(())
    }
}

/// Search-time parameters (§6 "Search parameters").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Candidate-list size at layer 0; effective `ef` is `max(topk, ef_search)` for kNN.
    pub ef_search: usize,
    /// Maximum candidates retained mid-search in Range mode; 0 means unbounded.
    #[serde(default)]
    pub range_limit: usize,
    /// Probability of deferring distance evaluation on a filter-rejected
    /// candidate (§4.G skip-threshold derivation).
    #[serde(default)]
    pub skip_ratio: f32,
    /// Range-search tolerance; `None` derives a metric-dependent default
    /// (`1e-4` for L2Sqr, `1e-5` for IP — see the §9 Open Question decision).
    #[serde(default)]
    pub range_epsilon: Option<f32>,
}

impl SearchParams {
    /// Default search parameters for the given `ef_search`.
    #[must_use]
    pub fn new(ef_search: usize) -> Self {
        Self {
            ef_search,
            range_limit: 0,
            skip_ratio: 0.0,
            range_epsilon: None,
        }
    }

    /// Resolve `range_epsilon`, falling back to the metric-dependent default
    /// when the caller left it unset.
    #[must_use]
    pub fn resolved_range_epsilon(&self, metric: MetricKind) -> f32 {
        self.range_epsilon.unwrap_or(match metric {
            MetricKind::L2 => 1e-4,
            MetricKind::Ip => 1e-5,
        })
    }
}

/// Outcome of inserting one vector via `add` (§9 Open Question decision:
/// duplicate detection is best-effort, not part of the contract — callers
/// must not assert a specific `duplicate_of` value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// The `InnerId` assigned to the inserted vector.
    pub inner_id: InnerId,
    /// If the beam search encountered an existing vertex within epsilon
    /// distance during insertion, its id; informational only.
    pub duplicate_of: Option<InnerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> BuildParams {
        BuildParams {
            dim: 128,
            metric_type: MetricKind::L2,
            max_degree: 16,
            ef_construction: 100,
            base_quantization_type: QuantizationKind::Flat,
            use_reorder: false,
            graph_storage_type: GraphStorageKind::Flat,
            heuristic: HeuristicKind::Alpha(1.0),
            seed: 7,
        }
    }

    #[test]
    fn build_params_round_trips_through_json() {
        let params = sample_params();
        let json = serde_json::to_string(&params).unwrap();
        let back: BuildParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn level_multiplier_matches_formula() {
        let params = sample_params();
        assert!((params.level_multiplier() - (1.0 / 16f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn search_params_default_epsilon_is_metric_dependent() {
        let p = SearchParams::new(50);
        assert_eq!(p.resolved_range_epsilon(MetricKind::L2), 1e-4);
        assert_eq!(p.resolved_range_epsilon(MetricKind::Ip), 1e-5);
    }

    #[test]
    fn explicit_epsilon_overrides_default() {
        let mut p = SearchParams::new(50);
        p.range_epsilon = Some(0.5);
        assert_eq!(p.resolved_range_epsilon(MetricKind::L2), 0.5);
    }

    #[test]
    fn validate_rejects_compressed_degree_above_elias_fano_cap() {
        let mut params = sample_params();
        params.graph_storage_type = GraphStorageKind::Compressed;
        params.max_degree = elias_fano::MAX_ELEMENTS + 1;
        let err = params.validate().unwrap_err();
        assert!(matches!(
            err,
            GraphError::CompressedDegreeTooLarge { .. }
        ));
    }

    #[test]
    fn validate_accepts_compressed_degree_at_elias_fano_cap() {
        let mut params = sample_params();
        params.graph_storage_type = GraphStorageKind::Compressed;
        params.max_degree = elias_fano::MAX_ELEMENTS;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn validate_ignores_degree_cap_for_flat_storage() {
        let mut params = sample_params();
        params.graph_storage_type = GraphStorageKind::Flat;
        params.max_degree = elias_fano::MAX_ELEMENTS + 50;
        assert!(params.validate().is_ok());
    }
}
