//! Benchmarks: quantizer training and per-vector encode/decode cost for the
//! two quantized encoding families (§4.C).
//!
//! Run with: `cargo bench --bench quant_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use edgevec::metric::MetricKind;
use edgevec::quantization::pq::ProductQuantizer;
use edgevec::quantization::scalar::ScalarQuantizer;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DIM: usize = 128;

fn random_corpus(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect()).collect()
}

fn bench_sq8_train(c: &mut Criterion) {
    let corpus = random_corpus(2_000, 1);
    let refs: Vec<&[f32]> = corpus.iter().map(Vec::as_slice).collect();
    c.bench_function("quant/sq8_train_2000", |b| {
        b.iter(|| black_box(ScalarQuantizer::train(black_box(&refs))));
    });
}

fn bench_sq8_roundtrip(c: &mut Criterion) {
    let corpus = random_corpus(2_000, 1);
    let refs: Vec<&[f32]> = corpus.iter().map(Vec::as_slice).collect();
    let quantizer = ScalarQuantizer::train(&refs);
    let sample = &corpus[0];
    c.bench_function("quant/sq8_quantize_dequantize", |b| {
        b.iter(|| {
            let code = quantizer.quantize(black_box(sample));
            black_box(quantizer.dequantize(&code))
        });
    });
}

fn bench_pq_train(c: &mut Criterion) {
    let corpus = random_corpus(1_024, 2);
    let refs: Vec<&[f32]> = corpus.iter().map(Vec::as_slice).collect();
    let mut group = c.benchmark_group("quant/pq_train");
    for &m in &[8usize, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |bencher, &m| {
            bencher.iter(|| {
                black_box(ProductQuantizer::train(black_box(&refs), DIM, m, MetricKind::L2, 5).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sq8_train, bench_sq8_roundtrip, bench_pq_train);
criterion_main!(benches);
