//! Insert and search orchestration (§4.I), built on the beam searcher
//! ([`super::search`]) and the edge-selection heuristic ([`crate::heuristic`]).

use crate::heuristic::{self, EdgeSelection};
use crate::label::{InnerId, Label};
use crate::params::{HeuristicKind, InsertOutcome, SearchParams};
use crate::storage::VectorStore;
use crate::Error;

use super::search::{beam_search, Candidate, InnerSearchParam, SearchMode};
use super::{ensure_layers, HierarchicalIndex, DUPLICATE_EPSILON};

fn edge_selection(kind: HeuristicKind) -> EdgeSelection {
    match kind {
        HeuristicKind::Alpha(a) => EdgeSelection::Alpha(a),
        HeuristicKind::Tau(t) => EdgeSelection::Tau(t),
    }
}

/// Insert one `(label, vec)` pair. See §4.I for the full procedure; this
/// mirrors its six numbered steps directly.
pub fn add_one(index: &HierarchicalIndex, label: Label, vec: &[f32]) -> Result<InsertOutcome, Error> {
    if vec.len() != index.params().dim {
        return Err(Error::InvalidArgument(format!(
            "expected dim {}, got {}",
            index.params().dim,
            vec.len()
        )));
    }

    // Step 1: assign InnerId under the global write lock, in lockstep with
    // the label table so the two structures never drift apart.
    let inner_id: InnerId;
    {
        let mut topo = index.topology().write();
        let mut labels = index.labels().write();
        if labels.contains(label) {
            return Err(Error::DuplicateLabel(label));
        }
        let mut store = index.store().write();
        let assigned = store.push(vec)?;
        let lid = labels.insert(label)?;
        debug_assert_eq!(assigned, lid, "label table and vector store must stay in lockstep");
        inner_id = assigned;
        topo.label_count = labels.len() as u32;
        index.visited_pool().note_capacity(labels.len());
    }
    log::debug!("assigned inner_id={inner_id} to label={label}");

    // Step 2: sample this vertex's top layer.
    let level = index.sample_level();

    let selection = edge_selection(index.params().heuristic);
    let current_entry = index.topology().snapshot().entry_point;

    let Some((mut ep_id, ep_level)) = current_entry else {
        // First vertex in the index: becomes the entry point with no edges.
        let mut graph = index.graph().write();
        ensure_layers(&mut graph, level, index.params());
        drop(graph);
        let mut topo = index.topology().write();
        topo.entry_point = Some((inner_id, level));
        topo.layer_count = level + 1;
        return Ok(InsertOutcome {
            inner_id,
            duplicate_of: None,
        });
    };

    {
        let mut graph = index.graph().write();
        ensure_layers(&mut graph, level.max(ep_level), index.params());
    }

    let store = index.store().read();
    let computer = store.make_query(vec)?;
    let mut duplicate_of = None;

    // Step 4: ef=1 descent through layers strictly above `level`.
    for layer in (level + 1..=ep_level).rev() {
        let graph = index.graph().read();
        let mut visited = index.visited_pool().take();
        let param = InnerSearchParam {
            ep: ep_id,
            mode: SearchMode::Knn { ef: 1, topk: 1 },
            filter: None,
            skip_ratio: 0.0,
        };
        let result = beam_search(&graph[layer as usize], &store, &computer, &mut visited, index.vertex_locks(), &param);
        index.visited_pool().release(visited);
        if let Some(best) = result.first() {
            ep_id = best.id;
        }
    }

    // Step 5: gather candidates and mutually connect at each layer this
    // vertex participates in.
    let top_layer = level.min(ep_level);
    for layer in (0..=top_layer).rev() {
        let mut visited = index.visited_pool().take();
        let candidates = {
            let graph = index.graph().read();
            let param = InnerSearchParam {
                ep: ep_id,
                mode: SearchMode::Knn {
                    ef: index.params().ef_construction,
                    topk: index.params().ef_construction,
                },
                filter: None,
                skip_ratio: 0.0,
            };
            beam_search(&graph[layer as usize], &store, &computer, &mut visited, index.vertex_locks(), &param)
        };
        index.visited_pool().release(visited);

        if layer == 0 {
            if let Some(closest) = candidates.first() {
                if closest.distance < DUPLICATE_EPSILON {
                    duplicate_of = Some(closest.id);
                }
            }
        }

        let pairs: Vec<(f32, InnerId)> = candidates.iter().map(|c| (c.distance, c.id)).collect();
        let mut graph = index.graph().write();
        let next = heuristic::mutually_connect(
            inner_id,
            &pairs,
            &mut graph[layer as usize],
            &store,
            index.vertex_locks(),
            selection,
        );
        if let Some(next_ep) = next {
            ep_id = next_ep;
        }
    }
    drop(store);

    // Step 6: upgrade the global entry point if this vertex climbed higher.
    if level > ep_level {
        let mut topo = index.topology().write();
        topo.entry_point = Some((inner_id, level));
        topo.layer_count = level + 1;
    }

    Ok(InsertOutcome { inner_id, duplicate_of })
}

fn resolve_entry(index: &HierarchicalIndex) -> Option<(InnerId, u16)> {
    index.topology().snapshot().entry_point
}

fn descend_to_layer0(
    index: &HierarchicalIndex,
    store: &VectorStore,
    computer: &crate::storage::QueryComputer,
    ep_id: InnerId,
    ep_level: u16,
) -> InnerId {
    let mut current = ep_id;
    for layer in (1..=ep_level).rev() {
        let graph = index.graph().read();
        if (layer as usize) >= graph.len() {
            continue;
        }
        let mut visited = index.visited_pool().take();
        let param = InnerSearchParam {
            ep: current,
            mode: SearchMode::Knn { ef: 1, topk: 1 },
            filter: None,
            skip_ratio: 0.0,
        };
        let result = beam_search(&graph[layer as usize], store, computer, &mut visited, index.vertex_locks(), &param);
        index.visited_pool().release(visited);
        if let Some(best) = result.first() {
            current = best.id;
        }
    }
    current
}

/// kNN search (§4.I "kNN search").
pub fn knn_search(
    index: &HierarchicalIndex,
    query: &[f32],
    topk: usize,
    params: SearchParams,
) -> Result<Vec<Candidate>, Error> {
    if query.len() != index.params().dim {
        return Err(Error::InvalidArgument(format!(
            "expected dim {}, got {}",
            index.params().dim,
            query.len()
        )));
    }
    let Some((ep_id, ep_level)) = resolve_entry(index) else {
        return Ok(Vec::new());
    };

    let store = index.store().read();
    let computer = store.make_query(query)?;
    let entry = descend_to_layer0(index, &store, &computer, ep_id, ep_level);

    let ef = params.ef_search.max(topk);
    let graph = index.graph().read();
    let mut visited = index.visited_pool().take();
    let param = InnerSearchParam {
        ep: entry,
        mode: SearchMode::Knn { ef, topk },
        filter: None,
        skip_ratio: params.skip_ratio,
    };
    let result = beam_search(&graph[0], &store, &computer, &mut visited, index.vertex_locks(), &param);
    index.visited_pool().release(visited);
    Ok(result)
}

/// Range search (§4.I "Range search").
pub fn range_search(
    index: &HierarchicalIndex,
    query: &[f32],
    radius: f32,
    params: SearchParams,
) -> Result<Vec<Candidate>, Error> {
    if query.len() != index.params().dim {
        return Err(Error::InvalidArgument(format!(
            "expected dim {}, got {}",
            index.params().dim,
            query.len()
        )));
    }
    let Some((ep_id, ep_level)) = resolve_entry(index) else {
        return Ok(Vec::new());
    };

    let store = index.store().read();
    let computer = store.make_query(query)?;
    let entry = descend_to_layer0(index, &store, &computer, ep_id, ep_level);

    let epsilon = params.resolved_range_epsilon(store.metric());
    let graph = index.graph().read();
    let mut visited = index.visited_pool().take();
    let param = InnerSearchParam {
        ep: entry,
        mode: SearchMode::Range {
            radius,
            range_limit: params.range_limit,
            epsilon,
        },
        filter: None,
        skip_ratio: params.skip_ratio,
    };
    let result = beam_search(&graph[0], &store, &computer, &mut visited, index.vertex_locks(), &param);
    index.visited_pool().release(visited);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStorageKind;
    use crate::metric::MetricKind;
    use crate::params::{BuildParams, QuantizationKind};

    fn build_index(dim: usize) -> HierarchicalIndex {
        HierarchicalIndex::new(BuildParams {
            dim,
            metric_type: MetricKind::L2,
            max_degree: 8,
            ef_construction: 32,
            base_quantization_type: QuantizationKind::Flat,
            use_reorder: false,
            graph_storage_type: GraphStorageKind::Flat,
            heuristic: HeuristicKind::Alpha(1.0),
            seed: 7,
        })
    }

    fn grid_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| (0..dim).map(|d| (i * 13 + d * 7) as f32 * 0.37).collect())
            .collect()
    }

    #[test]
    fn insert_then_find_self() {
        let index = build_index(4);
        index.train(&[]).unwrap();
        let vectors = grid_vectors(50, 4);
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as u64, v).unwrap();
        }
        let results = index
            .knn_search(&vectors[10], 1, SearchParams::new(50))
            .unwrap();
        assert_eq!(results[0].id, 10);
    }

    #[test]
    fn duplicate_label_rejected() {
        let index = build_index(4);
        index.train(&[]).unwrap();
        index.add(1, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        let err = index.add(1, &[1.0, 1.0, 1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::DuplicateLabel(1)));
    }

    #[test]
    fn dimension_mismatch_rejected_on_add_and_search() {
        let index = build_index(4);
        index.train(&[]).unwrap();
        let err = index.add(1, &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        index.add(2, &[0.0, 0.0, 0.0, 0.0]).unwrap();
        let err = index
            .knn_search(&[0.0, 0.0], 1, SearchParams::new(10))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn range_search_returns_nearby_points() {
        let index = build_index(2);
        index.train(&[]).unwrap();
        let vectors = grid_vectors(30, 2);
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as u64, v).unwrap();
        }
        let mut params = SearchParams::new(30);
        params.range_epsilon = Some(0.1);
        let results = index.range_search(&vectors[0], 5.0, params).unwrap();
        assert!(results.iter().any(|c| c.id == 0));
    }

    #[test]
    fn knn_results_are_non_decreasing() {
        let index = build_index(4);
        index.train(&[]).unwrap();
        let vectors = grid_vectors(80, 4);
        for (i, v) in vectors.iter().enumerate() {
            index.add(i as u64, v).unwrap();
        }
        let results = index
            .knn_search(&vectors[40], 10, SearchParams::new(80))
            .unwrap();
        for w in results.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
    }
}
