//! Product Quantization (PQ): the third required vector-store encoding family
//! (§4.C). Splits dimension `D` into `m` sub-vectors, trains one 256-centroid
//! codebook per sub-vector via k-means, and stores one `u8` code per sub-vector
//! (`code_size = m` bytes). Distance computation precomputes an `m x 256`
//! asymmetric distance table once per query (see [`PqComputer`]) so `compute`
//! is `m` table lookups per candidate rather than `D` floating point ops.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::metric::MetricKind;
use crate::quantization::QuantizationError;

/// Number of centroids per sub-quantizer codebook. Fixed at 256 so each code
/// fits in a single `u8`, per §4.C.
pub const CODEBOOK_SIZE: usize = 256;

/// Minimum number of training samples required per sub-vector's codebook.
pub const MIN_TRAINING_SAMPLES: usize = CODEBOOK_SIZE;

/// Trained product-quantizer calibration data: one codebook of `CODEBOOK_SIZE`
/// centroids per sub-vector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductQuantizer {
    dim: usize,
    num_subvectors: usize,
    sub_dim: usize,
    metric: MetricKind,
    /// `num_subvectors` codebooks, each `CODEBOOK_SIZE x sub_dim` f32 centroids,
    /// flattened as `codebooks[s * CODEBOOK_SIZE * sub_dim + c * sub_dim + d]`.
    codebooks: Vec<f32>,
}

impl ProductQuantizer {
    /// Full vector dimension this quantizer was trained for.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of sub-vectors (= encoded code size in bytes, one `u8` per sub-vector).
    #[must_use]
    pub fn num_subvectors(&self) -> usize {
        self.num_subvectors
    }

    /// Train a product quantizer splitting `dim` into `num_subvectors` equal parts.
    ///
    /// `dim` must be evenly divisible by `num_subvectors`; each sub-vector's
    /// codebook needs at least [`MIN_TRAINING_SAMPLES`] samples. Sub-vector
    /// assignment and the resulting asymmetric distance tables respect `metric`
    /// (§4.C / §9): `L2` uses squared Euclidean distance per sub-vector, `Ip`
    /// uses negated dot product so centroid assignment still ranks "closer" as
    /// "smaller", matching the metric the vector store was configured with.
    pub fn train(
        samples: &[&[f32]],
        dim: usize,
        num_subvectors: usize,
        metric: MetricKind,
        seed: u64,
    ) -> Result<Self, QuantizationError> {
        if num_subvectors == 0 || dim % num_subvectors != 0 {
            return Err(QuantizationError::InvalidDimension {
                dim,
                required_multiple_of: num_subvectors.max(1),
            });
        }
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(QuantizationError::InsufficientTrainingData {
                have: samples.len(),
                need: MIN_TRAINING_SAMPLES,
            });
        }
        for (i, s) in samples.iter().enumerate() {
            if s.len() != dim {
                return Err(QuantizationError::DimensionMismatch {
                    index: i,
                    expected: dim,
                    actual: s.len(),
                });
            }
        }

        let sub_dim = dim / num_subvectors;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut codebooks = vec![0.0f32; num_subvectors * CODEBOOK_SIZE * sub_dim];

        for s in 0..num_subvectors {
            let offset = s * sub_dim;
            let sub_samples: Vec<&[f32]> = samples
                .iter()
                .map(|v| &v[offset..offset + sub_dim])
                .collect();
            let centroids = kmeans(&sub_samples, CODEBOOK_SIZE, sub_dim, metric, &mut rng);
            let base = s * CODEBOOK_SIZE * sub_dim;
            for (c, centroid) in centroids.iter().enumerate() {
                codebooks[base + c * sub_dim..base + (c + 1) * sub_dim].copy_from_slice(centroid);
            }
        }

        Ok(Self {
            dim,
            num_subvectors,
            sub_dim,
            metric,
            codebooks,
        })
    }

    fn codebook(&self, sub: usize) -> &[f32] {
        let base = sub * CODEBOOK_SIZE * self.sub_dim;
        &self.codebooks[base..base + CODEBOOK_SIZE * self.sub_dim]
    }

    fn centroid(&self, sub: usize, code: u8) -> &[f32] {
        let cb = self.codebook(sub);
        let start = code as usize * self.sub_dim;
        &cb[start..start + self.sub_dim]
    }

    /// Encode one vector to `num_subvectors` bytes by nearest-centroid assignment.
    pub fn encode(&self, vector: &[f32]) -> Result<Vec<u8>, QuantizationError> {
        if vector.len() != self.dim {
            return Err(QuantizationError::DimensionMismatch {
                index: 0,
                expected: self.dim,
                actual: vector.len(),
            });
        }
        let mut code = Vec::with_capacity(self.num_subvectors);
        for s in 0..self.num_subvectors {
            let sub = &vector[s * self.sub_dim..(s + 1) * self.sub_dim];
            code.push(nearest_centroid(self.metric, sub, self.codebook(s), self.sub_dim));
        }
        Ok(code)
    }

    /// Reconstruct an approximate f32 vector from a PQ code.
    #[must_use]
    pub fn decode(&self, code: &[u8]) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dim);
        for (s, &c) in code.iter().enumerate() {
            out.extend_from_slice(self.centroid(s, c));
        }
        out
    }

    /// Precompute the `num_subvectors x CODEBOOK_SIZE` asymmetric distance
    /// table for `query`, under the metric this quantizer was trained with.
    ///
    /// For `Ip`, each entry is the negated per-subvector dot product; summing
    /// them gives `-dot(query, decoded)`, the full metric's `1 - dot(...)` form
    /// minus a constant `1`. That constant offset is the same for every
    /// candidate, so it never changes the ranking `compute`/`PqComputer` is used for.
    #[must_use]
    pub fn make_query(&self, query: &[f32]) -> PqComputer {
        let mut table = vec![0.0f32; self.num_subvectors * CODEBOOK_SIZE];
        for s in 0..self.num_subvectors {
            let q = &query[s * self.sub_dim..(s + 1) * self.sub_dim];
            let cb = self.codebook(s);
            for c in 0..CODEBOOK_SIZE {
                let centroid = &cb[c * self.sub_dim..(c + 1) * self.sub_dim];
                table[s * CODEBOOK_SIZE + c] = sub_distance(self.metric, q, centroid);
            }
        }
        PqComputer {
            num_subvectors: self.num_subvectors,
            table,
        }
    }

    /// Distance between two stored codes by decoding centroids and applying
    /// this quantizer's metric. Used for `compute_pair`, which is not on the
    /// hot query path.
    #[must_use]
    pub fn code_distance(&self, a: &[u8], b: &[u8]) -> f32 {
        let mut sum = 0.0;
        for s in 0..self.num_subvectors {
            sum += sub_distance(self.metric, self.centroid(s, a[s]), self.centroid(s, b[s]));
        }
        sum
    }
}

/// A cached per-query asymmetric distance table; `compute` against a code is
/// `num_subvectors` table lookups and additions, no floating-point re-derivation.
#[derive(Debug)]
pub struct PqComputer {
    num_subvectors: usize,
    table: Vec<f32>,
}

impl PqComputer {
    /// Sum the per-subvector table entries addressed by `code`.
    #[must_use]
    pub fn distance(&self, code: &[u8]) -> f32 {
        let mut sum = 0.0;
        for (s, &c) in code.iter().enumerate().take(self.num_subvectors) {
            sum += self.table[s * CODEBOOK_SIZE + c as usize];
        }
        sum
    }
}

fn l2_sqr(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Per-subvector "smaller is closer" distance matching `metric`: squared
/// Euclidean for `L2`, negated dot product for `Ip` (consistent up to a
/// per-candidate-constant offset with [`crate::metric::InnerProduct`]'s
/// `1 - dot` form — see [`ProductQuantizer::make_query`]).
fn sub_distance(metric: MetricKind, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        MetricKind::L2 => l2_sqr(a, b),
        MetricKind::Ip => -dot(a, b),
    }
}

fn nearest_centroid(metric: MetricKind, v: &[f32], codebook: &[f32], sub_dim: usize) -> u8 {
    let mut best = 0usize;
    let mut best_dist = f32::INFINITY;
    for c in 0..CODEBOOK_SIZE {
        let centroid = &codebook[c * sub_dim..(c + 1) * sub_dim];
        let d = sub_distance(metric, v, centroid);
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    best as u8
}

/// Lloyd's-algorithm k-means, seeded by sampling `k` distinct training points
/// (k-means++ is overkill at this scale; random-sample init converges fine
/// within the fixed iteration budget used here).
fn kmeans(
    samples: &[&[f32]],
    k: usize,
    dim: usize,
    metric: MetricKind,
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<f32>> {
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    indices.shuffle(rng);
    let mut centroids: Vec<Vec<f32>> = indices[..k].iter().map(|&i| samples[i].to_vec()).collect();

    const ITERATIONS: usize = 15;
    let mut assignment = vec![0usize; samples.len()];

    for _ in 0..ITERATIONS {
        for (i, &s) in samples.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = sub_distance(metric, s, centroid);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            assignment[i] = best;
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (i, &s) in samples.iter().enumerate() {
            let c = assignment[i];
            counts[c] += 1;
            for d in 0..dim {
                sums[c][d] += s[d];
            }
        }
        for c in 0..k {
            if counts[c] == 0 {
                continue; // keep the previous centroid for an empty cluster
            }
            for d in 0..dim {
                centroids[c][d] = sums[c][d] / counts[c] as f32;
            }
        }
    }

    centroids
}
