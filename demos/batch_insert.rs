//! Example: Batch Insert API
//!
//! Demonstrates batch insertion against the `Index` trait facade.
//!
//! Run with: `cargo run --example batch_insert`

use edgevec::batch::BatchInsertable;
use edgevec::index::create_index;
use edgevec::params::SearchParams;

fn main() {
    println!("=== EdgeVec Batch Insert Example ===\n");

    let params = serde_json::json!({
        "dim": 128,
        "metric_type": "l2",
        "max_degree": 16,
        "ef_construction": 100,
        "base_quantization_type": { "kind": "flat" },
        "use_reorder": false,
        "graph_storage_type": "flat",
        "heuristic": { "variant": "alpha", "value": 1.0 },
        "seed": 42,
    });
    let index = create_index("hnsw", &params.to_string()).expect("create index");

    println!("Created index with 128 dimensions");

    let vectors: Vec<(u64, Vec<f32>)> = (1..=1000)
        .map(|i| {
            let vector: Vec<f32> = (0..128).map(|j| ((i + j) as f32).sin()).collect();
            (i as u64, vector)
        })
        .collect();

    println!("Prepared {} vectors for insertion", vectors.len());
    println!("\nInserting vectors with progress tracking...");

    let ids = index
        .batch_insert(
            vectors,
            Some(|inserted, total| {
                let percent = (inserted as f32 / total as f32) * 100.0;
                println!("  Progress: {inserted}/{total} ({percent:.0}%)");
            }),
        )
        .expect("batch insert");

    println!("\nSuccessfully inserted {} vectors", ids.len());
    println!("Index now contains {} elements", index.get_stats().num_elements);

    println!("\n--- Second Batch (no progress tracking) ---");

    let more_vectors: Vec<(u64, Vec<f32>)> = (1001..=2000)
        .map(|i| {
            let vector: Vec<f32> = (0..128).map(|j| ((i + j) as f32).cos()).collect();
            (i as u64, vector)
        })
        .collect();

    let more_ids = index
        .batch_insert(more_vectors, None::<fn(usize, usize)>)
        .expect("batch insert");

    println!("Inserted {} more vectors", more_ids.len());
    println!("Index now contains {} total elements", index.get_stats().num_elements);

    println!("\n--- Search Verification ---");

    let query: Vec<f32> = (0..128).map(|j| (1.0 + j as f32).sin()).collect();
    let results = index
        .knn_search(&query, 5, SearchParams::new(50))
        .expect("search failed");

    println!("Top 5 nearest neighbors:");
    for (i, result) in results.iter().enumerate() {
        println!("  {}. InnerId: {}, Distance: {:.4}", i + 1, result.id, result.distance);
    }

    println!("\n--- Error Handling Demo ---");

    let vectors_with_duplicate: Vec<(u64, Vec<f32>)> = vec![
        (5001, vec![0.1; 128]),
        (1, vec![0.2; 128]),
        (5002, vec![0.3; 128]),
    ];

    let partial_ids = index
        .batch_insert(vectors_with_duplicate, None::<fn(usize, usize)>)
        .expect("batch insert");

    println!(
        "Attempted 3 vectors, {} inserted (duplicate skipped)",
        partial_ids.len()
    );
    println!("Index now contains {} total elements", index.get_stats().num_elements);

    println!("\n=== Example Complete ===");
}
