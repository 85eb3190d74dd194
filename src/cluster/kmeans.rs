use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::error::{MarqueeError, Result};
use crate::types::FeatureVector;

/// Mini-batch k-means.
///
/// 1. Seed centroids with k-means++.
/// 2. Draw a batch of `batch_size` observations without replacement.
/// 3. Move each observation's nearest centroid toward it with rate `1 / count`.
/// 4. Stop after `max_iterations`, or once no centroid moved more than `tolerance`
///    (squared euclidean) in one step.
///
/// The same seed and data always produce the same model.
#[derive(Debug, Clone)]
pub struct MiniBatchKMeans {
    pub k: usize,
    pub batch_size: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

/// A fitted clustering.
#[derive(Debug, Clone)]
pub struct KMeansModel {
    pub centroids: Vec<FeatureVector>,
    /// Label per training observation, in input order.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each observation to its centroid.
    pub inertia: f64,
    pub iterations: usize,
}

impl MiniBatchKMeans {
    pub fn new(k: usize, batch_size: usize, seed: u64) -> Self {
        Self {
            k,
            batch_size,
            max_iterations: 100,
            tolerance: 1e-6,
            seed,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn fit(&self, data: &[FeatureVector]) -> Result<KMeansModel> {
        validate(data, self.k)?;

        let n = data.len();
        let batch_size = self.batch_size.clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = kmeans_plus_plus(data, self.k, &mut rng);
        let mut counts = vec![0u64; self.k];

        let mut iterations = 0;
        for _ in 0..self.max_iterations {
            iterations += 1;
            let batch = sample(&mut rng, n, batch_size);
            let assigned: Vec<(usize, usize)> = batch
                .iter()
                .map(|idx| (idx, nearest(&centroids, &data[idx]).0))
                .collect();

            let previous = centroids.clone();
            for (idx, c) in assigned {
                counts[c] += 1;
                let eta = 1.0 / counts[c] as f64;
                for (w, x) in centroids[c].iter_mut().zip(&data[idx]) {
                    *w = (1.0 - eta) * *w + eta * x;
                }
            }

            let shift = previous
                .iter()
                .zip(&centroids)
                .map(|(a, b)| squared_distance(a, b))
                .fold(0.0, f64::max);
            if shift <= self.tolerance {
                break;
            }
        }

        if centroids.iter().flatten().any(|w| !w.is_finite()) {
            return Err(MarqueeError::ClusterBuild("non-finite centroid".into()));
        }

        let mut inertia = 0.0;
        let labels = data
            .iter()
            .map(|x| {
                let (label, dist) = nearest(&centroids, x);
                inertia += dist;
                label
            })
            .collect();

        Ok(KMeansModel {
            centroids,
            labels,
            inertia,
            iterations,
        })
    }
}

impl KMeansModel {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }
}

fn validate(data: &[FeatureVector], k: usize) -> Result<()> {
    if data.is_empty() {
        return Err(MarqueeError::ClusterBuild("no observations to cluster".into()));
    }
    if k == 0 {
        return Err(MarqueeError::ClusterBuild("cluster count must be positive".into()));
    }
    if k > data.len() {
        return Err(MarqueeError::ClusterBuild(format!(
            "{} observations cannot form {k} clusters",
            data.len()
        )));
    }
    let dim = data[0].len();
    if let Some(pos) = data.iter().position(|x| x.len() != dim) {
        return Err(MarqueeError::ClusterBuild(format!(
            "observation {pos} has {} dimensions, expected {dim}",
            data[pos].len()
        )));
    }
    if let Some(pos) = data.iter().position(|x| x.iter().any(|v| !v.is_finite())) {
        return Err(MarqueeError::ClusterBuild(format!(
            "observation {pos} contains a non-finite value"
        )));
    }
    Ok(())
}

/// k-means++ seeding: each next centroid is drawn with probability proportional to its
/// squared distance from the nearest centroid chosen so far.
fn kmeans_plus_plus(data: &[FeatureVector], k: usize, rng: &mut StdRng) -> Vec<FeatureVector> {
    let n = data.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.gen_range(0..n)].clone());

    let mut dist: Vec<f64> = data
        .iter()
        .map(|x| squared_distance(x, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = dist.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            dist.iter()
                .position(|&d| {
                    acc += d;
                    acc >= target && d > 0.0
                })
                .unwrap_or(n - 1)
        } else {
            // every point coincides with a centroid
            rng.gen_range(0..n)
        };

        let centroid = data[next].clone();
        for (d, x) in dist.iter_mut().zip(data) {
            *d = d.min(squared_distance(x, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn nearest(centroids: &[FeatureVector], x: &[f64]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(c, x)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
