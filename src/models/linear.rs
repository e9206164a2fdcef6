use std::mem;

use super::{dot, feature, penalty, weighted_sum};
use crate::{
    config::TrainingConfig,
    dataset::{Dataset, Datapoint},
    error::{MlErr, Result},
    optimization::{GradientModel, StochasticGradientModel, Trainable, ascend},
    persist::Persist,
    streaming::OnlineModel,
};

/// Ordinary least squares linear regression, `h(x) = θ · [1, x]`.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    dataset: Option<Dataset>,
    theta: Vec<f64>,
    learning_rate: f64,
    max_iterations: usize,
    regularization: f64,
    scratch: Vec<f64>,
}

impl LeastSquares {
    /// Creates a new `LeastSquares` model over a training set with a single label per row.
    ///
    /// # Arguments
    /// * `dataset` - The training set.
    /// * `learning_rate` - The step length of the optimizer.
    /// * `max_iterations` - The iteration cap, `0` meaning the default.
    pub fn new(dataset: Dataset, learning_rate: f64, max_iterations: usize) -> Self {
        let features = dataset.x_size();

        Self {
            dataset: Some(dataset),
            theta: vec![0.; features + 1],
            learning_rate,
            max_iterations,
            regularization: 0.,
            scratch: Vec::with_capacity(features + 1),
        }
    }

    /// Creates a new `LeastSquares` model without a training set, meant to be
    /// trained through the streaming protocol.
    ///
    /// # Arguments
    /// * `features` - The amount of features every incoming point will have.
    /// * `learning_rate` - The step length of every update.
    pub fn online(features: usize, learning_rate: f64) -> Self {
        Self {
            dataset: None,
            theta: vec![0.; features + 1],
            learning_rate,
            max_iterations: 0,
            regularization: 0.,
            scratch: Vec::with_capacity(features + 1),
        }
    }

    /// Creates a new `LeastSquares` model taking its hyperparameters from `config`.
    pub fn from_config(dataset: Dataset, config: &TrainingConfig) -> Self {
        Self::new(dataset, config.learning_rate, config.max_iterations)
            .with_regularization(config.regularization)
    }

    /// Sets the L2 regularization strength.
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Predicts the label of `x`.
    ///
    /// # Returns
    /// `MlErr::DimensionMismatch` if `x` doesn't have as many features as the model.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        weighted_sum(&self.theta, x)
    }

    fn point_gradient(&self, x: &[f64], y: f64, j: usize) -> f64 {
        (y - dot(&self.theta, x)) * feature(x, j) - penalty(&self.theta, self.regularization, j)
    }
}

impl Trainable for LeastSquares {
    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn examples(&self) -> usize {
        self.dataset.as_ref().map_or(0, Dataset::len)
    }

    fn theta(&self) -> &[f64] {
        &self.theta
    }

    fn theta_mut(&mut self) -> &mut [f64] {
        &mut self.theta
    }

    /// Half the mean squared error plus the L2 penalty.
    fn cost(&self) -> Option<f64> {
        let dataset = self.dataset.as_ref()?;
        let m = dataset.len() as f64;

        let error: f64 = dataset
            .iter()
            .map(|(x, y)| (dot(&self.theta, x) - y[0]).powi(2))
            .sum();

        let penalty: f64 = self.theta[1..].iter().map(|t| t * t).sum();

        Some((error + self.regularization * penalty) / (2. * m))
    }
}

impl GradientModel for LeastSquares {
    fn dj(&self, j: usize) -> f64 {
        let Some(dataset) = &self.dataset else {
            return 0.;
        };

        let sum: f64 = dataset
            .iter()
            .map(|(x, y)| (y[0] - dot(&self.theta, x)) * feature(x, j))
            .sum();

        sum - penalty(&self.theta, self.regularization, j)
    }
}

impl StochasticGradientModel for LeastSquares {
    fn dij(&self, i: usize, j: usize) -> f64 {
        let Some(dataset) = &self.dataset else {
            return 0.;
        };

        self.point_gradient(dataset.x(i), dataset.y(i)[0], j)
    }
}

impl Persist for LeastSquares {
    type State = Vec<f64>;

    fn state(&self) -> Self::State {
        self.theta.clone()
    }

    fn restore(&mut self, state: Self::State) -> Result<()> {
        if state.len() != self.theta.len() {
            return Err(MlErr::DimensionMismatch {
                got: state.len(),
                expected: self.theta.len(),
            });
        }

        self.theta = state;
        Ok(())
    }
}

impl OnlineModel for LeastSquares {
    fn dimensions(&self) -> usize {
        self.theta.len() - 1
    }

    fn label_dimensions(&self) -> Option<usize> {
        Some(1)
    }

    fn learn(&mut self, point: &Datapoint, index: usize) -> Result<()> {
        let Some(&y) = point.y.first() else {
            return Err(MlErr::DimensionMismatch {
                got: 0,
                expected: 1,
            });
        };

        let x = &point.x;
        let mut scratch = mem::take(&mut self.scratch);

        let result = ascend(self, &mut scratch, index, |m, j| m.point_gradient(x, y, j));

        self.scratch = scratch;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_validates_dimensions() {
        let model = LeastSquares::online(2, 1e-2);

        assert!(model.predict(&[1., 2.]).is_ok());
        assert!(matches!(
            model.predict(&[1.]),
            Err(MlErr::DimensionMismatch {
                got: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn regularization_shrinks_the_slope() {
        let xs: Vec<_> = (0..5).map(|x| vec![x as f64]).collect();
        let ys: Vec<_> = (0..5).map(|y| y as f64).collect();
        let dataset = Dataset::from_rows(&xs, &ys).unwrap();

        let mut plain = LeastSquares::new(dataset.clone(), 1e-2, 500);
        let mut ridge = LeastSquares::new(dataset, 1e-2, 500).with_regularization(10.);

        crate::optimization::BatchGradientAscent::new()
            .optimize(&mut plain)
            .unwrap();
        crate::optimization::BatchGradientAscent::new()
            .optimize(&mut ridge)
            .unwrap();

        assert!(ridge.theta()[1] < plain.theta()[1]);
    }

    #[test]
    fn learn_moves_towards_the_label() {
        let mut model = LeastSquares::online(1, 1e-1);
        let point = Datapoint::new(vec![1.], vec![2.]);

        model.learn(&point, 0).unwrap();

        // θ += α (y - 0) [1, x]
        assert_eq!(model.state(), [0.2, 0.2]);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut model = LeastSquares::online(2, 1e-2);
        model.restore(vec![1., 2., 3.]).unwrap();

        let json = model.to_json().unwrap();
        let mut other = LeastSquares::online(2, 1e-2);
        other.restore_json(&json).unwrap();

        assert_eq!(other.state(), [1., 2., 3.]);
        assert!(other.restore(vec![1.]).is_err());
    }
}
