//! Stats JSON (§6 "Stats JSON"): a small diagnostic snapshot an index can
//! produce on demand, not part of the hot path.

use serde::{Deserialize, Serialize};

use crate::label::InnerId;

/// Index-wide statistics, matching the required §6 stats shape exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Human-readable index name (e.g. `"hnsw"`).
    pub index_name: &'static str,
    /// Number of vectors currently stored.
    pub num_elements: usize,
    /// Approximate total memory footprint in bytes (graph + vector store).
    pub memory_bytes: usize,
    /// Current global entry point, if any vertex has been inserted.
    pub entry_point: Option<InnerId>,
    /// Number of layers currently allocated.
    pub layer_count: u16,
}
