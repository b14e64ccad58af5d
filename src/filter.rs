//! Minimal filter hook (§4.G): a boolean predicate over `InnerId`, deliberately
//! not the full attribute/region grammar named out of scope — it exists only
//! so the skip-ratio mechanics in the beam searcher have something to call.

use crate::label::InnerId;

/// A predicate the beam searcher consults while expanding candidates.
pub trait Filter {
    /// True if `id` should be considered a valid search result.
    fn valid(&self, id: InnerId) -> bool;

    /// Estimated fraction of ids that pass `valid`, in `(0, 1]`. `None` (the
    /// default) means "unknown", and the searcher falls back to `skip_ratio`
    /// alone rather than the selectivity-scaled threshold.
    fn valid_ratio(&self) -> Option<f32> {
        None
    }
}

/// The searcher's derived probability of skipping a distance computation on
/// a filter-rejected candidate (§4.G skip-threshold derivation).
#[must_use]
pub fn skip_threshold(filter: Option<&dyn Filter>, skip_ratio: f32) -> f32 {
    match filter.and_then(Filter::valid_ratio) {
        None => 0.0,
        Some(r) if r >= 1.0 => 0.0,
        Some(r) => 1.0 - (1.0 - r) * skip_ratio,
    }
}

/// A filter backed by an explicit allow-set, handy for tests and for hosts
/// that already materialize the valid id set before searching.
pub struct AllowList {
    allowed: std::collections::HashSet<InnerId>,
    total_universe: usize,
}

impl AllowList {
    /// Build an allow-list filter. `total_universe` is the index's current
    /// element count, used to derive `valid_ratio`.
    #[must_use]
    pub fn new(allowed: std::collections::HashSet<InnerId>, total_universe: usize) -> Self {
        Self {
            allowed,
            total_universe,
        }
    }
}

impl Filter for AllowList {
    fn valid(&self, id: InnerId) -> bool {
        self.allowed.contains(&id)
    }

    fn valid_ratio(&self) -> Option<f32> {
        if self.total_universe == 0 {
            return None;
        }
        Some(self.allowed.len() as f32 / self.total_universe as f32)
    }
}
