//! K-means clustering.
//!
//! `KMeans` is the plain Lloyd iteration, recomputing every point to centroid
//! distance on every pass. `TriangleKMeans` reaches the same assignments while
//! skipping most of those computations, carrying per point distance bounds
//! between iterations (Elkan, 2003). Both seed with k-means++ from an explicit
//! random number generator and run up to their iteration cap.

mod bounds;
mod distance;
mod kmeans;
mod seeding;
mod triangle;

pub use bounds::Bound;
pub use distance::{CentroidDistances, classify, distance, nearest, squared_distance};
pub use kmeans::KMeans;
pub use seeding::{Extent, kmeans_plus_plus};
pub use triangle::{PruningStats, TriangleKMeans};

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use crate::error::{MlErr, Result};

/// The lifecycle of a clustering model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No centroids yet.
    Uninitialized,
    /// Centroids were picked and every point assigned, no iteration ran yet.
    Seeded,
    /// At least one iteration ran and the cap wasn't reached.
    Assigning,
    /// The iteration cap was reached.
    IterationCapReached,
}

/// Validates the amount of clusters against the amount of points.
fn validate_k(k: usize, points: usize) -> Result<()> {
    if k == 0 || k > points {
        return Err(MlErr::InvalidConfig(format!(
            "the amount of clusters must be between 1 and {points}, got {k}"
        )));
    }

    Ok(())
}

/// Moves every centroid to the mean of its assigned points.
///
/// A centroid left without points is re-drawn uniformly inside `extent`.
///
/// # Arguments
/// * `data` - A `(n, d)` matrix of points.
/// * `assignments` - The centroid each point is assigned to.
/// * `k` - The amount of centroids.
/// * `extent` - The bounding box of `data`.
/// * `rng` - The random number generator for re-drawing centroids.
///
/// # Returns
/// The new centroids and how many of them had to be re-drawn.
fn recompute_centroids<R, I>(
    data: ArrayView2<'_, f64>,
    assignments: I,
    k: usize,
    extent: &Extent,
    rng: &mut R,
) -> (Array2<f64>, usize)
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = usize>,
{
    let mut sums = Array2::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];

    for (row, a) in data.rows().into_iter().zip(assignments) {
        let mut sum = sums.row_mut(a);
        sum += &row;
        counts[a] += 1;
    }

    let mut redrawn = 0;

    for (j, &count) in counts.iter().enumerate() {
        if count == 0 {
            sums.row_mut(j).assign(&extent.sample(rng));
            redrawn += 1;
        } else {
            let n = count as f64;
            sums.row_mut(j).mapv_inplace(|v| v / n);
        }
    }

    (sums, redrawn)
}

/// Converts a centroid matrix into nested vectors.
fn to_nested(centroids: ArrayView2<'_, f64>) -> Vec<Vec<f64>> {
    centroids.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Converts nested vectors into a `(k, d)` centroid matrix.
fn from_nested(state: &[Vec<f64>], k: usize, d: usize) -> Result<Array2<f64>> {
    if state.len() != k {
        return Err(MlErr::DimensionMismatch {
            got: state.len(),
            expected: k,
        });
    }

    let mut flat = Vec::with_capacity(k * d);

    for row in state {
        if row.len() != d {
            return Err(MlErr::DimensionMismatch {
                got: row.len(),
                expected: d,
            });
        }

        flat.extend_from_slice(row);
    }

    Array2::from_shape_vec((k, d), flat).map_err(|_| MlErr::DimensionMismatch {
        got: state.len(),
        expected: k,
    })
}
