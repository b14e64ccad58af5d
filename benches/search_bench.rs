//! Benchmarks: kNN and range search (§4.G) at varying `ef_search`, over a
//! fixed pre-built corpus.
//!
//! Run with: `cargo bench --bench search_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use edgevec::graph::GraphStorageKind;
use edgevec::hnsw::HierarchicalIndex;
use edgevec::metric::MetricKind;
use edgevec::params::{BuildParams, HeuristicKind, QuantizationKind, SearchParams};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DIM: usize = 64;
const CORPUS_SIZE: usize = 5_000;

fn build_index() -> (HierarchicalIndex, Vec<f32>) {
    let params = BuildParams {
        dim: DIM,
        metric_type: MetricKind::L2,
        max_degree: 16,
        ef_construction: 100,
        base_quantization_type: QuantizationKind::Flat,
        use_reorder: false,
        graph_storage_type: GraphStorageKind::Flat,
        heuristic: HeuristicKind::Alpha(1.0),
        seed: 9,
    };
    let index = HierarchicalIndex::new(params);
    index.train(&[]).unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut query = Vec::new();
    for i in 0..CORPUS_SIZE {
        let v: Vec<f32> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
        if i == CORPUS_SIZE / 2 {
            query = v.clone();
        }
        index.add(i as u64, &v).unwrap();
    }
    (index, query)
}

fn bench_knn(c: &mut Criterion) {
    let (index, query) = build_index();
    let mut group = c.benchmark_group("search/knn");
    for &ef in &[10usize, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(ef), &ef, |bencher, &ef| {
            bencher.iter(|| black_box(index.knn_search(&query, 10, SearchParams::new(ef)).unwrap()));
        });
    }
    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let (index, query) = build_index();
    let mut group = c.benchmark_group("search/range");
    for &radius in &[5.0f32, 20.0] {
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |bencher, &radius| {
            bencher.iter(|| black_box(index.range_search(&query, radius, SearchParams::new(50)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_knn, bench_range);
criterion_main!(benches);
