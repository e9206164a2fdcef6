use std::mem;

use super::{dot, feature, penalty, sigmoid, weighted_sum};
use crate::{
    config::TrainingConfig,
    dataset::{Dataset, Datapoint},
    error::{MlErr, Result},
    optimization::{GradientModel, StochasticGradientModel, Trainable, ascend},
    persist::Persist,
    streaming::OnlineModel,
};

/// Binary logistic regression, `h(x) = σ(θ · [1, x])`, labels in `{0, 1}`.
#[derive(Debug, Clone)]
pub struct Logistic {
    dataset: Option<Dataset>,
    theta: Vec<f64>,
    learning_rate: f64,
    max_iterations: usize,
    regularization: f64,
    scratch: Vec<f64>,
}

impl Logistic {
    /// Creates a new `Logistic` model over a training set with a single `{0, 1}` label per row.
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

    /// Creates a new `Logistic` model meant to be trained through the streaming protocol.
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

    pub fn from_config(dataset: Dataset, config: &TrainingConfig) -> Self {
        Self::new(dataset, config.learning_rate, config.max_iterations)
            .with_regularization(config.regularization)
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// The probability of `x` belonging to the positive class.
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        weighted_sum(&self.theta, x).map(sigmoid)
    }

    fn point_gradient(&self, x: &[f64], y: f64, j: usize) -> f64 {
        (y - sigmoid(dot(&self.theta, x))) * feature(x, j)
            - penalty(&self.theta, self.regularization, j)
    }
}

impl Trainable for Logistic {
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

    /// Mean cross entropy plus the L2 penalty.
    fn cost(&self) -> Option<f64> {
        const EPS: f64 = 1e-12;

        let dataset = self.dataset.as_ref()?;
        let m = dataset.len() as f64;

        let entropy: f64 = dataset
            .iter()
            .map(|(x, y)| {
                let h = sigmoid(dot(&self.theta, x)).clamp(EPS, 1. - EPS);
                -(y[0] * h.ln() + (1. - y[0]) * (1. - h).ln())
            })
            .sum();

        let penalty: f64 = self.theta[1..].iter().map(|t| t * t).sum();

        Some(entropy / m + self.regularization * penalty / (2. * m))
    }
}

impl GradientModel for Logistic {
    fn dj(&self, j: usize) -> f64 {
        let Some(dataset) = &self.dataset else {
            return 0.;
        };

        let sum: f64 = dataset
            .iter()
            .map(|(x, y)| (y[0] - sigmoid(dot(&self.theta, x))) * feature(x, j))
            .sum();

        sum - penalty(&self.theta, self.regularization, j)
    }
}

impl StochasticGradientModel for Logistic {
    fn dij(&self, i: usize, j: usize) -> f64 {
        let Some(dataset) = &self.dataset else {
            return 0.;
        };

        self.point_gradient(dataset.x(i), dataset.y(i)[0], j)
    }
}

impl Persist for Logistic {
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

impl OnlineModel for Logistic {
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
