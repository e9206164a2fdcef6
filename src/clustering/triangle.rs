use log::debug;
use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{
    Bound, CentroidDistances, Extent, Phase, classify, distance, from_nested, kmeans_plus_plus,
    recompute_centroids, to_nested, validate_k,
};
use crate::{
    dataset::Dataset,
    error::{MlErr, Result},
    optimization::resolve_iterations,
    persist::Persist,
};

/// Counters of the work done and avoided by `TriangleKMeans`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruningStats {
    /// Point to centroid distances actually computed.
    pub exact_distances: usize,
    /// Point to centroid distances the plain Lloyd iteration would have computed.
    pub naive_distances: usize,
    /// Points skipped entirely because their bound settled them.
    pub skipped_points: usize,
    /// Candidate centroids discarded by a bound test.
    pub skipped_candidates: usize,
}

impl PruningStats {
    /// The fraction of the plain iteration's distance computations that were avoided.
    pub fn saved(&self) -> f64 {
        if self.naive_distances == 0 {
            return 0.;
        }

        1. - self.exact_distances as f64 / self.naive_distances as f64
    }
}

/// K-means accelerated with the triangle inequality (Elkan, 2003).
///
/// Every point carries a `Bound` between iterations. A point whose upper bound
/// is within half the distance from its centroid to the closest other centroid
/// is skipped, and a candidate centroid is only measured when neither its lower
/// bound nor the centroid to centroid distance rules it out. Given the same
/// random number generator it produces the same assignments as `KMeans`, ties
/// included.
#[derive(Debug, Clone)]
pub struct TriangleKMeans<R: Rng> {
    k: usize,
    max_iterations: usize,
    dataset: Dataset,
    extent: Extent,
    centroids: Option<Array2<f64>>,
    bounds: Vec<Bound>,
    stats: PruningStats,
    phase: Phase,
    iterations: usize,
    rng: R,
}

impl<R: Rng> TriangleKMeans<R> {
    /// Creates a new `TriangleKMeans` model over an unlabeled training set.
    ///
    /// # Arguments
    /// * `dataset` - The points to cluster, labels are ignored.
    /// * `k` - The amount of clusters.
    /// * `max_iterations` - The iteration cap, `0` meaning the default.
    /// * `rng` - Drives the seeding and the re-drawing of empty clusters.
    ///
    /// # Returns
    /// `MlErr::InvalidConfig` if `k` is zero or larger than the amount of points.
    pub fn new(dataset: Dataset, k: usize, max_iterations: usize, rng: R) -> Result<Self> {
        validate_k(k, dataset.len())?;

        Ok(Self {
            k,
            max_iterations,
            extent: Extent::of(dataset.features()),
            dataset,
            centroids: None,
            bounds: Vec::new(),
            stats: PruningStats::default(),
            phase: Phase::Uninitialized,
            iterations: 0,
            rng,
        })
    }

    /// Creates a new `TriangleKMeans` model from raw points.
    ///
    /// # Returns
    /// `MlErr::EmptyDataset` if there are no points or they have no features.
    pub fn from_points(xs: &[Vec<f64>], k: usize, max_iterations: usize, rng: R) -> Result<Self> {
        Self::new(Dataset::unlabeled(xs)?, k, max_iterations, rng)
    }

    /// Picks the initial centroids with k-means++ and assigns every point
    /// computing all of its distances.
    pub fn seed(&mut self) {
        let centroids = kmeans_plus_plus(self.dataset.features(), self.k, &mut self.rng);

        self.reset_bounds(&centroids);
        self.centroids = Some(centroids);
        self.phase = Phase::Seeded;
        self.iterations = 0;
    }

    fn reset_bounds(&mut self, centroids: &Array2<f64>) {
        self.bounds = self
            .dataset
            .features()
            .rows()
            .into_iter()
            .map(|x| {
                let distances = centroids.rows().into_iter().map(|c| distance(x, c)).collect();
                Bound::exact(distances)
            })
            .collect();

        let computed = self.bounds.len() * self.k;
        self.stats.exact_distances += computed;
        self.stats.naive_distances += computed;
    }

    /// Runs a single iteration, seeding first if needed.
    ///
    /// Reassigns the points the bounds can't settle, moves every centroid to
    /// the mean of its points and loosens the bounds by how much each centroid
    /// moved. Does nothing once the iteration cap was reached.
    pub fn step(&mut self) -> Result<()> {
        if self.phase == Phase::Uninitialized {
            self.seed();
        }

        if self.phase == Phase::IterationCapReached {
            return Ok(());
        }

        let Some(centroids) = self.centroids.take() else {
            return Err(MlErr::NotFitted);
        };

        let data = self.dataset.features();
        let dists = CentroidDistances::compute(centroids.view());
        let before = self.stats;

        for (x, bound) in data.rows().into_iter().zip(self.bounds.iter_mut()) {
            if bound.is_settled(&dists) {
                self.stats.skipped_points += 1;
                continue;
            }

            for j in 0..self.k {
                if !bound.may_move_to(j, &dists) {
                    self.stats.skipped_candidates += 1;
                    continue;
                }

                if bound.is_stale() {
                    bound.refresh(distance(x, centroids.row(bound.assigned())));
                    self.stats.exact_distances += 1;

                    if !bound.may_move_to(j, &dists) {
                        self.stats.skipped_candidates += 1;
                        continue;
                    }
                }

                bound.offer(j, distance(x, centroids.row(j)));
                self.stats.exact_distances += 1;
            }
        }

        self.stats.naive_distances += data.nrows() * self.k;

        let (next, redrawn) = recompute_centroids(
            data,
            self.bounds.iter().map(Bound::assigned),
            self.k,
            &self.extent,
            &mut self.rng,
        );

        let movements: Vec<f64> = centroids
            .rows()
            .into_iter()
            .zip(next.rows())
            .map(|(old, new)| distance(old, new))
            .collect();

        for bound in &mut self.bounds {
            bound.shift(&movements);
        }

        self.centroids = Some(next);
        self.iterations += 1;
        self.phase = if self.iterations >= resolve_iterations(self.max_iterations) {
            Phase::IterationCapReached
        } else {
            Phase::Assigning
        };

        debug!(
            iteration = self.iterations,
            exact = self.stats.exact_distances - before.exact_distances,
            skipped_points = self.stats.skipped_points - before.skipped_points,
            skipped_candidates = self.stats.skipped_candidates - before.skipped_candidates,
            redrawn = redrawn;
            "elkan iteration"
        );

        Ok(())
    }

    /// Seeds the centroids and iterates up to the cap.
    pub fn fit(&mut self) -> Result<()> {
        while self.phase != Phase::IterationCapReached {
            self.step()?;
        }

        debug!(
            iterations = self.iterations,
            saved = self.stats.saved();
            "elkan k-means finished"
        );

        Ok(())
    }

    /// Classifies `x` into the cluster of its closest centroid.
    pub fn predict(&self, x: &[f64]) -> Result<usize> {
        let centroids = self.centroids.as_ref().ok_or(MlErr::NotFitted)?;
        classify(centroids.view(), x)
    }

    /// The cluster each training point is currently assigned to.
    pub fn assignments(&self) -> Vec<usize> {
        self.bounds.iter().map(Bound::assigned).collect()
    }

    pub fn centroids(&self) -> Option<ArrayView2<'_, f64>> {
        self.centroids.as_ref().map(|c| c.view())
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn stats(&self) -> PruningStats {
        self.stats
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl<R: Rng> Persist for TriangleKMeans<R> {
    type State = Vec<Vec<f64>>;

    fn state(&self) -> Self::State {
        self.centroids
            .as_ref()
            .map(|c| to_nested(c.view()))
            .unwrap_or_default()
    }

    /// Replaces the centroids and re-assigns every point exactly.
    fn restore(&mut self, state: Self::State) -> Result<()> {
        let centroids = from_nested(&state, self.k, self.dataset.x_size())?;

        self.reset_bounds(&centroids);
        self.centroids = Some(centroids);
        self.phase = Phase::Seeded;
        self.iterations = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::clustering::KMeans;

    const EPSILON: f64 = 1e-9;

    fn blobs(centers: &[[f64; 2]], per_blob: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut xs = Vec::with_capacity(centers.len() * per_blob);

        for _ in 0..per_blob {
            for [cx, cy] in centers {
                xs.push(vec![
                    cx + rng.random_range(-1.0..1.0),
                    cy + rng.random_range(-1.0..1.0),
                ]);
            }
        }

        xs
    }

    fn assert_bounds_hold(model: &TriangleKMeans<StdRng>) {
        let data = model.dataset().features();
        let centroids = model.centroids().unwrap();

        for (x, bound) in data.rows().into_iter().zip(model.bounds()) {
            for (j, c) in centroids.rows().into_iter().enumerate() {
                assert!(bound.lower()[j] <= distance(x, c) + EPSILON);
            }

            let assigned = centroids.row(bound.assigned());
            assert!(bound.upper() >= distance(x, assigned) - EPSILON);
        }
    }

    #[test]
    fn bounds_hold_after_every_iteration() {
        let xs = blobs(&[[-5., 0.], [5., 0.], [0., 6.], [0., -6.]], 25, 3);
        let mut model = TriangleKMeans::from_points(&xs, 4, 15, StdRng::seed_from_u64(9)).unwrap();

        model.seed();
        assert_bounds_hold(&model);

        while model.phase() != Phase::IterationCapReached {
            model.step().unwrap();
            assert_bounds_hold(&model);
        }

        assert_eq!(model.iterations(), 15);
    }

    #[test]
    fn matches_plain_kmeans_from_the_same_seed() {
        let xs = blobs(&[[-4., -4.], [4., 4.], [4., -4.]], 30, 11);

        let mut plain = KMeans::new(
            Dataset::unlabeled(&xs).unwrap(),
            3,
            12,
            StdRng::seed_from_u64(21),
        )
        .unwrap();
        plain.fit().unwrap();

        let mut fast = TriangleKMeans::from_points(&xs, 3, 12, StdRng::seed_from_u64(21)).unwrap();
        fast.fit().unwrap();

        assert_eq!(plain.assignments(), fast.assignments().as_slice());

        let a = plain.centroids().unwrap();
        let b = fast.centroids().unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < EPSILON);
        }
    }

    #[test]
    fn separates_two_blobs() {
        let xs = blobs(&[[-7., 0.], [7., 0.]], 50, 5);
        let mut model = TriangleKMeans::from_points(&xs, 2, 0, StdRng::seed_from_u64(2)).unwrap();
        model.fit().unwrap();

        assert_eq!(model.iterations(), resolve_iterations(0));

        let left = model.predict(&[-7., 0.]).unwrap();
        let right = model.predict(&[7., 0.]).unwrap();
        assert_ne!(left, right);

        let assignments = model.assignments();
        let agreeing = xs
            .iter()
            .zip(&assignments)
            .filter(|(x, a)| **a == if x[0] < 0. { left } else { right })
            .count();

        assert!(agreeing as f64 / xs.len() as f64 >= 0.95);
    }

    #[test]
    fn most_distances_are_pruned() {
        let xs = blobs(&[[-10., 0.], [10., 0.], [0., 10.]], 40, 8);
        let mut model = TriangleKMeans::from_points(&xs, 3, 20, StdRng::seed_from_u64(4)).unwrap();
        model.fit().unwrap();

        let stats = model.stats();
        assert!(stats.skipped_points > 0);
        assert!(stats.exact_distances < stats.naive_distances);
        assert!(stats.saved() > 0.5);
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let err = TriangleKMeans::from_points(&[], 2, 0, StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, MlErr::EmptyDataset));
    }

    #[test]
    fn predict_validates_dimensions() {
        let xs = blobs(&[[0., 0.], [5., 5.]], 5, 1);
        let mut model = TriangleKMeans::from_points(&xs, 2, 3, StdRng::seed_from_u64(0)).unwrap();

        assert!(matches!(model.predict(&[0., 0.]), Err(MlErr::NotFitted)));

        model.fit().unwrap();
        assert!(matches!(
            model.predict(&[0., 0., 0.]),
            Err(MlErr::DimensionMismatch {
                got: 3,
                expected: 2
            })
        ));
    }

    #[test]
    fn restore_reassigns_every_point() {
        let xs = vec![vec![0.], vec![1.], vec![9.], vec![10.]];
        let mut model = TriangleKMeans::from_points(&xs, 2, 5, StdRng::seed_from_u64(0)).unwrap();

        model.restore(vec![vec![10.], vec![0.]]).unwrap();

        assert_eq!(model.assignments(), [1, 1, 0, 0]);
        assert_eq!(model.phase(), Phase::Seeded);
        assert!(model.restore(vec![vec![1., 2.], vec![3., 4.]]).is_err());
    }
}
