use log::{debug, warn};

use super::{StochasticGradientModel, ascend, ensure_trainable, resolve_iterations};
use crate::error::Result;

/// Stochastic gradient ascent.
///
/// Every iteration sweeps the training examples in order, committing one
/// simultaneous update per example. Noisier than the batch form but every
/// update only touches a single example.
#[derive(Debug, Default, Clone, Copy)]
pub struct StochasticGradientAscent;

impl StochasticGradientAscent {
    /// Returns a new `StochasticGradientAscent`.
    pub fn new() -> Self {
        Self
    }

    /// Trains `model` in place.
    ///
    /// # Arguments
    /// * `model` - The model whose parameters will be optimized.
    ///
    /// # Returns
    /// `MlErr::EmptyDataset` if there is nothing to train on, or `MlErr::Diverged`
    /// as soon as any parameter becomes non finite.
    pub fn optimize<M>(&self, model: &mut M) -> Result<()>
    where
        M: StochasticGradientModel + ?Sized,
    {
        ensure_trainable(model)?;

        let iterations = resolve_iterations(model.max_iterations());
        let examples = model.examples();
        let mut next = Vec::with_capacity(model.theta().len());

        debug!(iterations = iterations, examples = examples; "starting stochastic gradient ascent");

        for iteration in 0..iterations {
            for i in 0..examples {
                if let Err(e) = ascend(model, &mut next, iteration, |m, j| m.dij(i, j)) {
                    warn!(example = i; "stochastic gradient ascent aborted: {e}");
                    return Err(e);
                }
            }
        }

        debug!("stochastic gradient ascent finished: cost={:?}", model.cost());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::Dataset,
        error::MlErr,
        models::{LeastSquares, Logistic},
        optimization::Trainable,
    };

    #[test]
    fn fits_a_line_with_intercept() {
        // y = 2 + 0.5x
        let xs: Vec<_> = (0..10).map(|x| vec![x as f64]).collect();
        let ys: Vec<_> = (0..10).map(|x| 2.0 + 0.5 * x as f64).collect();
        let dataset = Dataset::from_rows(&xs, &ys).unwrap();
        let mut model = LeastSquares::new(dataset, 5e-3, 2000);

        StochasticGradientAscent::new().optimize(&mut model).unwrap();

        let theta = model.theta();
        assert!((theta[0] - 2.0).abs() < 5e-2, "bias {}", theta[0]);
        assert!((theta[1] - 0.5).abs() < 1e-2, "slope {}", theta[1]);
    }

    #[test]
    fn separates_two_classes() {
        let xs: Vec<_> = (-10..=10)
            .filter(|&x| x != 0)
            .map(|x| vec![x as f64])
            .collect();
        let ys: Vec<_> = xs.iter().map(|x| (x[0] > 0.0) as u8 as f64).collect();
        let dataset = Dataset::from_rows(&xs, &ys).unwrap();
        let mut model = Logistic::new(dataset, 1e-1, 200);

        StochasticGradientAscent::new().optimize(&mut model).unwrap();

        assert!(model.predict(&[3.0]).unwrap() > 0.9);
        assert!(model.predict(&[-3.0]).unwrap() < 0.1);
    }

    #[test]
    fn huge_learning_rate_diverges() {
        let xs: Vec<_> = (0..5).map(|x| vec![x as f64]).collect();
        let ys: Vec<_> = (0..5).map(|y| y as f64).collect();
        let dataset = Dataset::from_rows(&xs, &ys).unwrap();
        let mut model = LeastSquares::new(dataset, 1e6, 1000);

        let err = StochasticGradientAscent::new()
            .optimize(&mut model)
            .unwrap_err();

        assert!(matches!(err, MlErr::Diverged { .. }));
    }
}
