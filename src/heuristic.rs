//! Edge-selection heuristic and mutual-connect (§4.H), ported from the
//! reference implementation's `pruning_strategy.cpp`. Two heuristic variants
//! share one shape: sort candidates closest-first, then greedily keep a
//! candidate only if it isn't dominated by an already-kept, closer candidate.
//! They differ only in the domination test (`EdgeSelection::dominates`).

use crate::concurrency::LockStripe;
use crate::graph::GraphStore;
use crate::label::InnerId;
use crate::storage::VectorStore;

/// Which edge-selection variant to apply, and its single scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeSelection {
    /// Robust-pruning variant: a kept candidate at distance `d_keep` blocks a
    /// later candidate at distance `d` whenever `alpha * d_keep < d`.
    Alpha(f32),
    /// tau-MG variant: a kept candidate blocks a later one only once the
    /// later one is more than `3 * tau` farther out than the query distance,
    /// and candidates within `3 * tau` of the query are always admitted.
    Tau(f32),
}

impl EdgeSelection {
    /// True if `kept` (already-selected, at `dist_to_kept` from the candidate
    /// under consideration) rules out admitting a candidate at `dist_to_query`
    /// from the query.
    fn dominates(self, dist_to_query: f32, dist_to_kept: f32) -> bool {
        match self {
            EdgeSelection::Alpha(alpha) => alpha * dist_to_kept < dist_to_query,
            EdgeSelection::Tau(tau) => dist_to_kept < dist_to_query - 3.0 * tau,
        }
    }

    /// True if a candidate this close to the query must be admitted regardless
    /// of domination (only the tau variant has this early-accept rule).
    fn always_admit(self, dist_to_query: f32) -> bool {
        match self {
            EdgeSelection::Alpha(_) => false,
            EdgeSelection::Tau(tau) => dist_to_query <= 3.0 * tau,
        }
    }
}

/// Prune `candidates` (distance, id pairs, any order) down to at most
/// `max_size` entries using the configured heuristic. A no-op if there are
/// fewer than `max_size` candidates (§4.H: the heuristic only fires once the
/// overflow threshold is reached).
#[must_use]
pub fn select_edges_by_heuristic(
    candidates: &[(f32, InnerId)],
    max_size: usize,
    store: &VectorStore,
    param: EdgeSelection,
) -> Vec<(f32, InnerId)> {
    if candidates.len() < max_size {
        return candidates.to_vec();
    }

    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut kept: Vec<(f32, InnerId)> = Vec::with_capacity(max_size);
    for &(dist_to_query, id) in &sorted {
        if kept.len() >= max_size {
            break;
        }
        let mut admit = true;
        for &(_, kept_id) in &kept {
            let dist_to_kept = store.compute_pair(kept_id, id);
            if param.always_admit(dist_to_query) {
                break;
            }
            if param.dominates(dist_to_query, dist_to_kept) {
                admit = false;
                break;
            }
        }
        if admit {
            kept.push((dist_to_query, id));
        }
    }
    kept
}

/// Insert `cur_c`'s edges to its pruned candidate set, then re-prune each
/// affected neighbor's own list if adding the back-edge would overflow it.
/// Returns the farthest of `cur_c`'s newly selected neighbors, used by the
/// caller as the next layer-down entry point (§4.I insert procedure).
///
/// Locking discipline: each neighbor's slot is locked exactly once, for the
/// duration of its own read-modify-write, never nested with another
/// neighbor's lock — so this can't deadlock against itself.
pub fn mutually_connect(
    cur_c: InnerId,
    candidates: &[(f32, InnerId)],
    graph: &mut GraphStore,
    store: &VectorStore,
    locks: &LockStripe,
    param: EdgeSelection,
) -> Option<InnerId> {
    let max_size = graph.max_degree();
    let selected = select_edges_by_heuristic(candidates, max_size, store, param);

    let selected_ids: Vec<InnerId> = selected.iter().map(|&(_, id)| id).collect();
    let next_closest = selected_ids.last().copied();

    graph
        .set_neighbors(cur_c, &selected_ids)
        .expect("heuristic output already bounded to max_degree");

    for &neighbor in &selected_ids {
        debug_assert_ne!(neighbor, cur_c, "heuristic must not select self as a neighbor");

        let _guard = locks.write(neighbor);
        let mut their_neighbors = graph.get_neighbors(neighbor);

        if their_neighbors.len() < max_size {
            their_neighbors.push(cur_c);
            graph
                .set_neighbors(neighbor, &their_neighbors)
                .expect("list grew by one, still within max_degree");
        } else {
            let d_max = store.compute_pair(cur_c, neighbor);
            let mut merged: Vec<(f32, InnerId)> = vec![(d_max, cur_c)];
            for &other in &their_neighbors {
                merged.push((store.compute_pair(other, neighbor), other));
            }
            let repruned = select_edges_by_heuristic(&merged, max_size, store, param);
            let repruned_ids: Vec<InnerId> = repruned.iter().map(|&(_, id)| id).collect();
            graph
                .set_neighbors(neighbor, &repruned_ids)
                .expect("heuristic output already bounded to max_degree");
        }
    }

    next_closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStorageKind;
    use crate::metric::MetricKind;

    fn store_with(vectors: &[[f32; 2]]) -> VectorStore {
        let mut store = VectorStore::new(2, MetricKind::L2, crate::storage::EncodingKind::Flat);
        store.train(&[]).unwrap();
        for v in vectors {
            store.push(v).unwrap();
        }
        store
    }

    #[test]
    fn no_prune_when_under_capacity() {
        let store = store_with(&[[0.0, 0.0], [1.0, 0.0]]);
        let candidates = vec![(1.0, 1)];
        let out = select_edges_by_heuristic(&candidates, 4, &store, EdgeSelection::Alpha(1.0));
        assert_eq!(out, candidates);
    }

    #[test]
    fn alpha_keeps_closest_and_drops_dominated() {
        // Three colinear points: candidate 1 at distance 1, candidate 2 at
        // distance 1.1 but right next to candidate 1 (dominated at alpha=1.0).
        let store = store_with(&[
            [0.0, 0.0], // query stand-in, id 0
            [1.0, 0.0], // id 1, dist 1.0
            [1.1, 0.0], // id 2, dist 1.1, but 0.1 from id 1
        ]);
        let candidates = vec![(1.0, 1), (1.1, 2)];
        let out = select_edges_by_heuristic(&candidates, 1, &store, EdgeSelection::Alpha(1.0));
        assert_eq!(out, vec![(1.0, 1)]);
    }

    #[test]
    fn mutual_connect_adds_backedge() {
        let store = store_with(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        let mut graph = GraphStore::new(GraphStorageKind::Flat, 4);
        graph.resize(3);
        let locks = LockStripe::new();

        let candidates = vec![(1.0, 1), (2.0, 2)];
        let next = mutually_connect(0, &candidates, &mut graph, &store, &locks, EdgeSelection::Alpha(1.0));
        assert!(next.is_some());
        assert!(graph.get_neighbors(1).contains(&0));
        assert!(graph.get_neighbors(2).contains(&0));
    }

    #[test]
    fn mutual_connect_reprunes_full_neighbor() {
        let store = store_with(&[[0.0, 0.0], [1.0, 0.0], [1.0, 0.1], [1.0, 0.2]]);
        let mut graph = GraphStore::new(GraphStorageKind::Flat, 2);
        graph.resize(4);
        graph.set_neighbors(1, &[2, 3]).unwrap();
        let locks = LockStripe::new();

        let candidates = vec![(1.0, 1)];
        mutually_connect(0, &candidates, &mut graph, &store, &locks, EdgeSelection::Alpha(1.0));

        // neighbor 1's list stayed within its degree cap after the reprune.
        assert!(graph.get_neighbors(1).len() <= 2);
    }
}
