//! Beam searcher (§4.G): the shared greedy best-first traversal used both by
//! `add` (layer descent and per-layer candidate gathering) and by the public
//! `knn_search`/`range_search` entry points.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::concurrency::LockStripe;
use crate::filter::{skip_threshold, Filter};
use crate::graph::GraphStore;
use crate::label::InnerId;
use crate::storage::QueryComputer;
use crate::storage::VectorStore;
use crate::visited::VisitedList;

/// A `(distance, id)` pair ordered by distance, ties broken by the larger
/// `InnerId` first (§4.G "Ordering guarantees"), for deterministic output.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    /// Distance from the query.
    pub distance: f32,
    /// The candidate vertex.
    pub id: InnerId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.id == other.id
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Which mode the beam searcher runs in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchMode {
    /// Admit the `ef` (or `topk`) closest candidates seen so far.
    Knn {
        /// Candidate-list width.
        ef: usize,
        /// Number of results ultimately returned.
        topk: usize,
    },
    /// Admit every candidate within `radius`, optionally capped at `range_limit`.
    Range {
        /// Distance cutoff.
        radius: f32,
        /// Cap on the live candidate set mid-search; 0 means unbounded.
        range_limit: usize,
        /// Tolerance subtracted/added when filtering the final result set.
        epsilon: f32,
    },
}

/// Everything one call to [`beam_search`] needs beyond the graph/store/visited
/// triple, collected per §4.G's `InnerSearchParam`.
pub struct InnerSearchParam<'a> {
    /// Entry point to start the traversal from.
    pub ep: InnerId,
    /// Search mode (kNN or Range) and its parameters.
    pub mode: SearchMode,
    /// Optional predicate restricting which candidates count as valid results.
    pub filter: Option<&'a dyn Filter>,
    /// Base skip-ratio fed into the skip-threshold derivation.
    pub skip_ratio: f32,
}

/// Run one greedy best-first traversal of layer `graph`, starting from
/// `param.ep`, and return the admitted candidates sorted closest-first.
///
/// `visited` is caller-owned scratch (from the [`crate::visited::VisitedListPool`])
/// so repeated calls across layers don't reallocate.
pub fn beam_search(
    graph: &GraphStore,
    store: &VectorStore,
    computer: &QueryComputer,
    visited: &mut VisitedList,
    locks: &LockStripe,
    param: &InnerSearchParam<'_>,
) -> Vec<Candidate> {
    let mut top: BinaryHeap<Candidate> = BinaryHeap::new();
    let mut cand: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();

    let d0 = store.compute_one(computer, param.ep);
    visited.mark(param.ep);
    let ep_admitted = param.filter.map_or(true, |f| f.valid(param.ep));
    if ep_admitted {
        top.push(Candidate {
            distance: d0,
            id: param.ep,
        });
    }
    cand.push(Reverse(Candidate {
        distance: d0,
        id: param.ep,
    }));

    let threshold = skip_threshold(param.filter, param.skip_ratio);

    while let Some(Reverse(current)) = cand.pop() {
        if let SearchMode::Knn { ef, .. } = param.mode {
            if top.len() >= ef {
                if let Some(worst) = top.peek() {
                    if current.distance > worst.distance {
                        break;
                    }
                }
            }
        }

        let neighbors = {
            let _guard = locks.read(current.id);
            graph.get_neighbors(current.id)
        };

        for v in neighbors {
            if !visited.mark(v) {
                continue;
            }

            if let Some(filter) = param.filter {
                if !filter.valid(v) && bernoulli_skip(threshold) {
                    continue;
                }
            }

            let d = store.compute_one(computer, v);
            let admit_valid = param.filter.map_or(true, |f| f.valid(v));

            match param.mode {
                SearchMode::Knn { ef, .. } => {
                    let admit =
                        top.len() < ef || d < top.peek().map_or(f32::INFINITY, |c| c.distance);
                    if admit {
                        cand.push(Reverse(Candidate { distance: d, id: v }));
                        if admit_valid {
                            top.push(Candidate { distance: d, id: v });
                            if top.len() > ef {
                                top.pop();
                            }
                        }
                    }
                }
                SearchMode::Range {
                    radius, range_limit, ..
                } => {
                    if d <= radius {
                        cand.push(Reverse(Candidate { distance: d, id: v }));
                        if admit_valid {
                            top.push(Candidate { distance: d, id: v });
                            if range_limit > 0 && top.len() > range_limit {
                                top.pop();
                            }
                        }
                    }
                }
            }
        }
    }

    let mut results: Vec<Candidate> = top.into_vec();
    match param.mode {
        SearchMode::Knn { topk, .. } => {
            results.sort();
            results.truncate(topk);
        }
        SearchMode::Range { radius, epsilon, .. } => {
            results.retain(|c| c.distance <= radius + epsilon);
            results.sort();
        }
    }
    results
}

fn bernoulli_skip(threshold: f32) -> bool {
    if threshold <= 0.0 {
        return false;
    }
    if threshold >= 1.0 {
        return true;
    }
    rand::random::<f32>() < threshold
}
