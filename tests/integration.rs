//! Integration scenarios (§8), exercised at reduced-but-meaningful scale
//! against the public API only (`HierarchicalIndex` plus the `Index` trait
//! facade) — no internal graph/store accessors are reachable from here,
//! which is itself part of what these tests confirm.

use std::collections::HashSet;

use edgevec::graph::GraphStorageKind;
use edgevec::hnsw::HierarchicalIndex;
use edgevec::index::{create_index, deserialize, Dataset, Index};
use edgevec::metric::MetricKind;
use edgevec::params::{BuildParams, HeuristicKind, QuantizationKind, SearchParams};
use edgevec::persistence::MemoryBackend;
use edgevec::Error;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn lcg_corpus(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect()).collect()
}

fn brute_force_topk(corpus: &[Vec<f32>], query: &[f32], k: usize) -> Vec<usize> {
    let mut dists: Vec<(f32, usize)> = corpus
        .iter()
        .enumerate()
        .map(|(i, v)| (MetricKind::L2.distance(v, query), i))
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0));
    dists.into_iter().take(k).map(|(_, i)| i).collect()
}

fn base_params(dim: usize, storage: GraphStorageKind, seed: u64) -> BuildParams {
    BuildParams {
        dim,
        metric_type: MetricKind::L2,
        max_degree: 16,
        ef_construction: 80,
        base_quantization_type: QuantizationKind::Flat,
        use_reorder: false,
        graph_storage_type: storage,
        heuristic: HeuristicKind::Alpha(1.0),
        seed,
    }
}

/// S1: recall@10 against brute-force ground truth stays high at a reduced
/// (but non-trivial) scale.
#[test]
fn s1_recall_at_10_is_high() {
    const DIM: usize = 32;
    const N: usize = 1_500;
    const QUERIES: usize = 50;
    const K: usize = 10;

    let params = base_params(DIM, GraphStorageKind::Flat, 0x5eed);
    let index = HierarchicalIndex::new(params);
    index.train(&[]).unwrap();

    let corpus = lcg_corpus(N, DIM, 1);
    for (i, v) in corpus.iter().enumerate() {
        index.add(i as u64, v).unwrap();
    }

    let queries = lcg_corpus(QUERIES, DIM, 2);
    let mut hits = 0usize;
    for query in &queries {
        let truth: HashSet<usize> = brute_force_topk(&corpus, query, K).into_iter().collect();
        let results = index.knn_search(query, K, SearchParams::new(150)).unwrap();
        hits += results.iter().filter(|c| truth.contains(&(c.id as usize))).count();
    }

    let recall = hits as f32 / (QUERIES * K) as f32;
    assert!(recall >= 0.85, "recall@{K} = {recall} too low");
}

/// S2/S4 folded in here (per §8 guidance): the same corpus used for S1 also
/// exercises range search and duplicate-insert handling.
#[test]
fn s2_range_search_matches_brute_force_within_radius() {
    const DIM: usize = 16;
    const N: usize = 500;

    let params = base_params(DIM, GraphStorageKind::Flat, 11);
    let index = HierarchicalIndex::new(params);
    index.train(&[]).unwrap();

    let corpus = lcg_corpus(N, DIM, 3);
    for (i, v) in corpus.iter().enumerate() {
        index.add(i as u64, v).unwrap();
    }

    let query = &corpus[0];
    let radius = 6.0;
    let results = index
        .range_search(query, radius, SearchParams::new(100))
        .unwrap();

    let truth: HashSet<usize> = corpus
        .iter()
        .enumerate()
        .filter(|(_, v)| MetricKind::L2.distance(v, query) <= radius)
        .map(|(i, _)| i)
        .collect();

    let found: HashSet<usize> = results.iter().map(|c| c.id as usize).collect();
    let recovered = found.intersection(&truth).count();
    assert!(
        recovered as f32 >= 0.8 * truth.len().max(1) as f32,
        "range search recovered {recovered}/{} within radius",
        truth.len()
    );
}

#[test]
fn s4_duplicate_label_is_rejected_without_corrupting_index() {
    let params = base_params(8, GraphStorageKind::Flat, 2);
    let index = HierarchicalIndex::new(params);
    index.train(&[]).unwrap();

    index.add(1, &[0.0; 8]).unwrap();
    let err = index.add(1, &[1.0; 8]).unwrap_err();
    assert!(matches!(err, Error::DuplicateLabel(1)));
    assert_eq!(index.get_stats().num_elements, 1);
}

/// S3: insert, serialize, deserialize into a fresh index, compare stats and
/// a fixed query's top-10 against the original.
#[test]
fn s3_serialize_then_deserialize_preserves_search_results() {
    const DIM: usize = 24;
    const N: usize = 800;

    let params = base_params(DIM, GraphStorageKind::Flat, 77);
    let index = HierarchicalIndex::new(params.clone());
    index.train(&[]).unwrap();

    let corpus = lcg_corpus(N, DIM, 9);
    for (i, v) in corpus.iter().enumerate() {
        index.add(i as u64, v).unwrap();
    }

    let query = lcg_corpus(1, DIM, 123).remove(0);
    let before = index.knn_search(&query, 10, SearchParams::new(100)).unwrap();

    let mut backend = MemoryBackend::new();
    edgevec::persistence::write_index(&index, &mut backend).unwrap();
    let mut reader = MemoryBackend::from_bytes(backend.into_inner());
    let restored = edgevec::persistence::read_index(&mut reader, &params).unwrap();

    assert_eq!(restored.get_stats().num_elements, index.get_stats().num_elements);
    let after = restored.knn_search(&query, 10, SearchParams::new(100)).unwrap();

    let before_ids: Vec<u32> = before.iter().map(|c| c.id).collect();
    let after_ids: Vec<u32> = after.iter().map(|c| c.id).collect();
    assert_eq!(before_ids, after_ids);
}

/// S5: malformed inputs and incompatible deserialization targets fail with
/// the documented error variants instead of panicking.
#[test]
fn s5_malformed_inputs_surface_documented_errors() {
    let params = base_params(8, GraphStorageKind::Flat, 3);
    let index = HierarchicalIndex::new(params.clone());
    index.train(&[]).unwrap();
    index.add(1, &[0.0; 8]).unwrap();

    let err = index.add(1, &[1.0; 8]).unwrap_err();
    assert!(matches!(err, Error::DuplicateLabel(1)));

    let err = index.add(2, &[0.0; 7]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let mut backend = MemoryBackend::new();
    edgevec::persistence::write_index(&index, &mut backend).unwrap();

    let mut mismatched = params;
    mismatched.max_degree = 4;
    let mut reader = MemoryBackend::from_bytes(backend.into_inner());
    let err = edgevec::persistence::read_index(&mut reader, &mismatched).unwrap_err();
    assert!(matches!(err, edgevec::persistence::PersistenceError::IncompatibleParams(_)));
}

/// S6: compressed graph storage uses no more memory than flat and produces
/// equivalent kNN results for the same insert sequence.
#[test]
fn s6_compressed_graph_storage_matches_flat_results_and_saves_memory() {
    const DIM: usize = 20;
    const N: usize = 600;

    let corpus = lcg_corpus(N, DIM, 55);
    let queries = lcg_corpus(50, DIM, 56);

    let flat = HierarchicalIndex::new(base_params(DIM, GraphStorageKind::Flat, 200));
    flat.train(&[]).unwrap();
    let compressed = HierarchicalIndex::new(base_params(DIM, GraphStorageKind::Compressed, 200));
    compressed.train(&[]).unwrap();

    for (i, v) in corpus.iter().enumerate() {
        flat.add(i as u64, v).unwrap();
        compressed.add(i as u64, v).unwrap();
    }

    assert!(compressed.get_stats().memory_bytes <= flat.get_stats().memory_bytes);

    let mut agree = 0usize;
    for query in &queries {
        let a: HashSet<u32> = flat
            .knn_search(query, 10, SearchParams::new(100))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        let b: HashSet<u32> = compressed
            .knn_search(query, 10, SearchParams::new(100))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        agree += a.intersection(&b).count();
    }
    let overlap = agree as f32 / (queries.len() * 10) as f32;
    assert!(overlap >= 0.9, "flat/compressed kNN overlap {overlap} too low");
}

#[test]
fn trait_facade_round_trips_through_create_index_and_deserialize() {
    let params = serde_json::to_string(&base_params(4, GraphStorageKind::Flat, 1)).unwrap();
    let index = create_index("hnsw", &params).unwrap();

    let ids = [1u64, 2, 3, 4];
    let vectors: Vec<f32> = (0..16).map(|i| i as f32 * 0.1).collect();
    let dataset = Dataset {
        num_elements: 4,
        dim: 4,
        ids: &ids,
        float32_vectors: &vectors,
    };
    let outcomes = index.add(&dataset).unwrap();
    assert!(outcomes.iter().all(Result::is_ok));

    let mut backend = MemoryBackend::new();
    index.serialize(&mut backend).unwrap();
    let mut reader = MemoryBackend::from_bytes(backend.into_inner());
    let restored = deserialize("hnsw", &mut reader, &params).unwrap();
    assert_eq!(restored.get_stats().num_elements, 4);
}
