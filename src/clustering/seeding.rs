use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;

use super::distance::squared_distance;

/// Picks `k` initial centroids among the rows of `data` with k-means++.
///
/// The first centroid is chosen uniformly at random, every other one with
/// probability proportional to its squared distance to the closest centroid
/// chosen so far.
///
/// # Arguments
/// * `data` - A `(n, d)` matrix of points, `n` must be positive.
/// * `k` - The amount of centroids.
/// * `rng` - The random number generator driving the selection.
pub fn kmeans_plus_plus<R>(data: ArrayView2<'_, f64>, k: usize, rng: &mut R) -> Array2<f64>
where
    R: Rng + ?Sized,
{
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));

    if k == 0 {
        return centroids;
    }

    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = data
        .rows()
        .into_iter()
        .map(|x| squared_distance(x, centroids.row(0)))
        .collect();

    for c in 1..k {
        let chosen = sample_weighted(&closest, rng);
        centroids.row_mut(c).assign(&data.row(chosen));

        for (i, x) in data.rows().into_iter().enumerate() {
            closest[i] = closest[i].min(squared_distance(x, centroids.row(c)));
        }
    }

    centroids
}

/// Samples an index with probability proportional to its weight, uniformly if
/// every weight is zero.
fn sample_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();

    if total <= 0. {
        return rng.random_range(0..weights.len());
    }

    let threshold = rng.random::<f64>() * total;
    let mut cumsum = 0.;
    let mut last_positive = 0;

    for (i, &w) in weights.iter().enumerate() {
        if w <= 0. {
            continue;
        }

        cumsum += w;
        last_positive = i;

        if cumsum > threshold {
            return i;
        }
    }

    last_positive
}

/// The axis aligned bounding box of a dataset, used to re-draw the centroid of
/// a cluster that was left without points.
#[derive(Debug, Clone)]
pub struct Extent {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl Extent {
    /// Computes the bounding box of the rows of `data`.
    pub fn of(data: ArrayView2<'_, f64>) -> Self {
        let d = data.ncols();
        let mut low = vec![f64::INFINITY; d];
        let mut high = vec![f64::NEG_INFINITY; d];

        for row in data.rows() {
            for (j, &v) in row.iter().enumerate() {
                low[j] = low[j].min(v);
                high[j] = high[j].max(v);
            }
        }

        Self { low, high }
    }

    /// Draws a point uniformly at random inside the box.
    ///
    /// Interpolates between the corners so a box wider than `f64::MAX` still
    /// yields finite coordinates.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&lo, &hi)| {
                if lo < hi {
                    let t: f64 = rng.random();
                    (lo * (1. - t) + hi * t).clamp(lo, hi)
                } else {
                    lo
                }
            })
            .collect()
    }
}
