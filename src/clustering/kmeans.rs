use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;

use super::{
    Extent, Phase, classify, distance, from_nested, kmeans_plus_plus, nearest,
    recompute_centroids, to_nested, validate_k,
};
use crate::{
    dataset::{Dataset, Datapoint},
    error::{MlErr, Result},
    optimization::resolve_iterations,
    persist::Persist,
    streaming::OnlineModel,
};

/// K-means clustering with the plain Lloyd iteration.
///
/// Every iteration assigns each point to its closest centroid computing every
/// distance, then moves each centroid to the mean of its points. A model can
/// also keep learning from a stream, moving the closest centroid towards every
/// incoming point.
#[derive(Debug, Clone)]
pub struct KMeans<R: Rng> {
    k: usize,
    max_iterations: usize,
    learning_rate: f64,
    dataset: Option<Dataset>,
    centroids: Option<Array2<f64>>,
    assignments: Vec<usize>,
    phase: Phase,
    rng: R,
}

impl<R: Rng> KMeans<R> {
    /// Creates a new `KMeans` model over an unlabeled training set.
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
            learning_rate: 0.,
            assignments: vec![0; dataset.len()],
            dataset: Some(dataset),
            centroids: None,
            phase: Phase::Uninitialized,
            rng,
        })
    }

    /// Creates a new `KMeans` model from known centroids, meant to be trained
    /// through the streaming protocol.
    ///
    /// # Arguments
    /// * `centroids` - The initial centroids, all with the same dimensions.
    /// * `learning_rate` - How far the closest centroid moves towards each point.
    /// * `rng` - Kept for re-fitting.
    pub fn online(centroids: Vec<Vec<f64>>, learning_rate: f64, rng: R) -> Result<Self> {
        let k = centroids.len();
        let d = centroids.first().map_or(0, Vec::len);

        if k == 0 || d == 0 {
            return Err(MlErr::EmptyDataset);
        }

        Ok(Self {
            k,
            max_iterations: 0,
            learning_rate,
            dataset: None,
            centroids: Some(from_nested(&centroids, k, d)?),
            assignments: vec![],
            phase: Phase::Seeded,
            rng,
        })
    }

    /// Sets how far the closest centroid moves towards each streamed point.
    ///
    /// Models built with `new` start at `0` and reject streamed points until
    /// this is set.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Seeds the centroids with k-means++ and iterates up to the cap.
    ///
    /// # Returns
    /// `MlErr::EmptyDataset` if the model was created without a training set.
    pub fn fit(&mut self) -> Result<()> {
        let Some(dataset) = &self.dataset else {
            return Err(MlErr::EmptyDataset);
        };

        let data = dataset.features();
        let extent = Extent::of(data);
        let iterations = resolve_iterations(self.max_iterations);
        let mut centroids = kmeans_plus_plus(data, self.k, &mut self.rng);

        for iteration in 0..iterations {
            if iteration == 0 {
                assign(data, centroids.view(), &mut self.assignments);
            } else {
                reassign(data, centroids.view(), &mut self.assignments);
            }

            let (next, redrawn) = recompute_centroids(
                data,
                self.assignments.iter().copied(),
                self.k,
                &extent,
                &mut self.rng,
            );

            if redrawn > 0 {
                debug!(iteration = iteration, redrawn = redrawn; "re-drew empty clusters");
            }

            centroids = next;
        }

        self.centroids = Some(centroids);
        self.phase = Phase::IterationCapReached;
        Ok(())
    }

    /// Classifies `x` into the cluster of its closest centroid.
    pub fn predict(&self, x: &[f64]) -> Result<usize> {
        let centroids = self.centroids.as_ref().ok_or(MlErr::NotFitted)?;
        classify(centroids.view(), x)
    }

    /// The cluster each training point was assigned to on the last iteration.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    pub fn centroids(&self) -> Option<ArrayView2<'_, f64>> {
        self.centroids.as_ref().map(|c| c.view())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Assigns every point to its closest centroid.
fn assign(data: ArrayView2<'_, f64>, centroids: ArrayView2<'_, f64>, out: &mut [usize]) {
    for (row, a) in data.rows().into_iter().zip(out.iter_mut()) {
        *a = nearest(row, centroids).0;
    }
}

/// Moves every point to a strictly closer centroid, scanning in index order.
///
/// A point tied between its current centroid and another one stays put, the
/// same rule `Bound::offer` follows.
fn reassign(data: ArrayView2<'_, f64>, centroids: ArrayView2<'_, f64>, out: &mut [usize]) {
    for (row, a) in data.rows().into_iter().zip(out.iter_mut()) {
        let mut best = distance(row, centroids.row(*a));

        for (j, centroid) in centroids.rows().into_iter().enumerate() {
            let d = distance(row, centroid);

            if d < best {
                *a = j;
                best = d;
            }
        }
    }
}

impl<R: Rng> Persist for KMeans<R> {
    type State = Vec<Vec<f64>>;

    fn state(&self) -> Self::State {
        self.centroids
            .as_ref()
            .map(|c| to_nested(c.view()))
            .unwrap_or_default()
    }

    fn restore(&mut self, state: Self::State) -> Result<()> {
        let d = match (&self.centroids, &self.dataset) {
            (Some(c), _) => c.ncols(),
            (None, Some(dataset)) => dataset.x_size(),
            (None, None) => state.first().map_or(0, Vec::len),
        };

        self.centroids = Some(from_nested(&state, self.k, d)?);
        self.phase = Phase::Seeded;
        Ok(())
    }
}

impl<R: Rng + Send + 'static> OnlineModel for KMeans<R> {
    fn dimensions(&self) -> usize {
        match (&self.centroids, &self.dataset) {
            (Some(c), _) => c.ncols(),
            (None, Some(dataset)) => dataset.x_size(),
            (None, None) => 0,
        }
    }

    fn label_dimensions(&self) -> Option<usize> {
        None
    }

    fn learn(&mut self, point: &Datapoint, index: usize) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0. {
            return Err(MlErr::InvalidConfig(format!(
                "the learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        let centroids = self.centroids.as_mut().ok_or(MlErr::NotFitted)?;
        let x = ArrayView1::from(point.x.as_slice());
        let (j, _) = nearest(x, centroids.view());

        let mut centroid = centroids.row_mut(j);
        let next = &centroid + &((&x - &centroid) * self.learning_rate);

        if let Some(coordinate) = next.iter().position(|v| !v.is_finite()) {
            return Err(MlErr::Diverged {
                iteration: index,
                coordinate,
            });
        }

        centroid.assign(&next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn blobs() -> Dataset {
        let mut xs = Vec::new();

        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            xs.push(vec![-7. + jitter, jitter]);
            xs.push(vec![7. - jitter, -jitter]);
        }

        Dataset::unlabeled(&xs).unwrap()
    }

    #[test]
    fn separates_two_blobs() {
        let mut model = KMeans::new(blobs(), 2, 10, StdRng::seed_from_u64(1)).unwrap();
        model.fit().unwrap();

        let left = model.predict(&[-7., 0.]).unwrap();
        let right = model.predict(&[7., 0.]).unwrap();
        assert_ne!(left, right);
        assert_eq!(model.phase(), Phase::IterationCapReached);

        for (i, &a) in model.assignments().iter().enumerate() {
            let expected = if i % 2 == 0 { left } else { right };
            assert_eq!(a, expected);
        }
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = KMeans::new(blobs(), 2, 10, StdRng::seed_from_u64(1)).unwrap();
        assert!(matches!(model.predict(&[0., 0.]), Err(MlErr::NotFitted)));
    }

    #[test]
    fn predict_is_idempotent() {
        let mut model = KMeans::new(blobs(), 2, 10, StdRng::seed_from_u64(5)).unwrap();
        model.fit().unwrap();

        let a = model.predict(&[1., 1.]).unwrap();
        let b = model.predict(&[1., 1.]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn learn_moves_the_closest_centroid() {
        let centroids = vec![vec![0., 0.], vec![10., 10.]];
        let mut model = KMeans::online(centroids, 0.5, StdRng::seed_from_u64(0)).unwrap();

        model.learn(&Datapoint::new(vec![2., 0.], vec![]), 0).unwrap();

        assert_eq!(model.state(), [vec![1., 0.], vec![10., 10.]]);
    }

    #[test]
    fn learn_needs_a_learning_rate() {
        let mut model = KMeans::new(blobs(), 2, 5, StdRng::seed_from_u64(1)).unwrap();
        model.fit().unwrap();
        let before = model.state();

        let err = model
            .learn(&Datapoint::new(vec![0., 0.], vec![]), 0)
            .unwrap_err();

        assert!(matches!(err, MlErr::InvalidConfig(_)));
        assert_eq!(model.state(), before);

        let mut model = model.with_learning_rate(0.5);
        assert!(model.learn(&Datapoint::new(vec![0., 0.], vec![]), 1).is_ok());
        assert_ne!(model.state(), before);
    }

    #[test]
    fn ties_keep_the_current_centroid() {
        let data = ndarray::array![[0.], [1.], [5.]];
        let centroids = ndarray::array![[0.], [2.]];
        let mut out = vec![1, 1, 0];

        reassign(data.view(), centroids.view(), &mut out);

        assert_eq!(out, [0, 1, 1]);

        assign(data.view(), centroids.view(), &mut out);
        assert_eq!(out, [0, 0, 1]);
    }

    #[test]
    fn too_many_clusters_are_rejected() {
        let dataset = Dataset::unlabeled(&[vec![1.], vec![2.]]).unwrap();
        let err = KMeans::new(dataset, 3, 0, StdRng::seed_from_u64(0)).unwrap_err();

        assert!(matches!(err, MlErr::InvalidConfig(_)));
    }
}
