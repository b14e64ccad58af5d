//! Example: Recall Validation
//!
//! Builds an HNSW index over a synthetic corpus and measures recall@10
//! against brute-force ground truth, exercising the S1 scenario at a small,
//! fast scale.
//!
//! Run with: `cargo run --example recall_validation`

use edgevec::graph::GraphStorageKind;
use edgevec::hnsw::HierarchicalIndex;
use edgevec::metric::MetricKind;
use edgevec::params::{BuildParams, HeuristicKind, QuantizationKind, SearchParams};

fn lcg_vector(dim: usize, mut state: u64) -> Vec<f32> {
    (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

fn brute_force_topk(corpus: &[Vec<f32>], query: &[f32], k: usize) -> Vec<usize> {
    let mut dists: Vec<(f32, usize)> = corpus
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let d: f32 = v.iter().zip(query).map(|(a, b)| (a - b).powi(2)).sum();
            (d, i)
        })
        .collect();
    dists.sort_by(|a, b| a.0.total_cmp(&b.0));
    dists.into_iter().take(k).map(|(_, i)| i).collect()
}

fn main() {
    const DIM: usize = 32;
    const N: usize = 2000;
    const QUERIES: usize = 100;
    const K: usize = 10;

    let params = BuildParams {
        dim: DIM,
        metric_type: MetricKind::L2,
        max_degree: 16,
        ef_construction: 100,
        base_quantization_type: QuantizationKind::Flat,
        use_reorder: false,
        graph_storage_type: GraphStorageKind::Flat,
        heuristic: HeuristicKind::Alpha(1.0),
        seed: 0x5eed,
    };
    let index = HierarchicalIndex::new(params);
    index.train(&[]).expect("train");

    println!("Building index over {N} vectors (dim={DIM})...");
    let corpus: Vec<Vec<f32>> = (0..N).map(|i| lcg_vector(DIM, i as u64 + 1)).collect();
    for (i, v) in corpus.iter().enumerate() {
        index.add(i as u64, v).expect("insert");
    }

    println!("Running {QUERIES} queries, k={K}, ef_search=100...");
    let mut total_hits = 0usize;
    for q in 0..QUERIES {
        let query = lcg_vector(DIM, (N + q) as u64 + 1);
        let ground_truth = brute_force_topk(&corpus, &query, K);
        let results = index
            .knn_search(&query, K, SearchParams::new(100))
            .expect("search");

        let found: std::collections::HashSet<u32> = results.iter().map(|c| c.id).collect();
        total_hits += ground_truth.iter().filter(|&&i| found.contains(&(i as u32))).count();
    }

    let recall = total_hits as f32 / (QUERIES * K) as f32;
    println!("recall@{K} = {recall:.4}");
}
