use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{MlErr, Result};

/// The squared euclidean distance between `a` and `b`.
pub fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// The euclidean distance between `a` and `b`.
pub fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Finds the closest centroid to `point`, the lowest index wins ties.
///
/// # Returns
/// The index of the centroid and the distance to it.
pub fn nearest(point: ArrayView1<'_, f64>, centroids: ArrayView2<'_, f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);

    for (j, centroid) in centroids.rows().into_iter().enumerate() {
        let d = distance(point, centroid);

        if d < best.1 {
            best = (j, d);
        }
    }

    best
}

/// Assigns `x` to its closest centroid, validating its dimensions first.
///
/// # Arguments
/// * `centroids` - A `(k, d)` matrix of centroids.
/// * `x` - The point to classify.
pub fn classify(centroids: ArrayView2<'_, f64>, x: &[f64]) -> Result<usize> {
    let expected = centroids.ncols();

    if x.len() != expected {
        return Err(MlErr::DimensionMismatch {
            got: x.len(),
            expected,
        });
    }

    Ok(nearest(ArrayView1::from(x), centroids).0)
}

/// Distances between every pair of centroids, recomputed once per iteration.
#[derive(Debug, Clone)]
pub struct CentroidDistances {
    /// `half[[a, b]]` is half the distance between centroids `a` and `b`.
    half: Array2<f64>,
    /// Half the distance from each centroid to its closest other centroid.
    nearest_half: Vec<f64>,
}

impl CentroidDistances {
    /// Computes the distances between every pair of `centroids`.
    pub fn compute(centroids: ArrayView2<'_, f64>) -> Self {
        let k = centroids.nrows();
        let mut half = Array2::zeros((k, k));
        let mut nearest_half = vec![f64::INFINITY; k];

        for a in 0..k {
            for b in a + 1..k {
                let d = 0.5 * distance(centroids.row(a), centroids.row(b));

                half[[a, b]] = d;
                half[[b, a]] = d;
                nearest_half[a] = nearest_half[a].min(d);
                nearest_half[b] = nearest_half[b].min(d);
            }
        }

        Self { half, nearest_half }
    }

    /// Half the distance between centroids `a` and `b`.
    pub fn half(&self, a: usize, b: usize) -> f64 {
        self.half[[a, b]]
    }

    /// Half the distance from centroid `a` to its closest other centroid,
    /// infinite if there's a single centroid.
    pub fn nearest_half(&self, a: usize) -> f64 {
        self.nearest_half[a]
    }
}
