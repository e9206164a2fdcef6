use log::{debug, warn};

use super::{GradientModel, ascend, ensure_trainable, resolve_iterations};
use crate::error::Result;

/// Batch gradient ascent.
///
/// Every iteration evaluates the whole-dataset gradient on each coordinate and
/// updates all of them simultaneously. There's no convergence test, the optimizer
/// always runs up to the model's iteration cap unless the parameters diverge.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchGradientAscent;

impl BatchGradientAscent {
    /// Returns a new `BatchGradientAscent`.
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
        M: GradientModel + ?Sized,
    {
        ensure_trainable(model)?;

        let iterations = resolve_iterations(model.max_iterations());
        let mut next = Vec::with_capacity(model.theta().len());

        debug!(iterations = iterations, features = model.theta().len(); "starting batch gradient ascent");

        for iteration in 0..iterations {
            if let Err(e) = ascend(model, &mut next, iteration, |m, j| m.dj(j)) {
                warn!("batch gradient ascent aborted: {e}");
                return Err(e);
            }
        }

        debug!("batch gradient ascent finished: cost={:?}", model.cost());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Dataset, error::MlErr, models::LeastSquares, optimization::Trainable};

    fn identity_line() -> Dataset {
        let xs: Vec<_> = (0..5).map(|x| vec![x as f64]).collect();
        let ys: Vec<_> = (0..5).map(|y| y as f64).collect();
        Dataset::from_rows(&xs, &ys).unwrap()
    }

    #[test]
    fn fits_the_identity_line() {
        let mut model = LeastSquares::new(identity_line(), 1e-2, 500);

        BatchGradientAscent::new().optimize(&mut model).unwrap();

        let prediction = model.predict(&[10.0]).unwrap();
        assert!((prediction - 10.0).abs() < 1e-1, "predicted {prediction}");
    }

    #[test]
    fn cost_does_not_increase() {
        let mut model = LeastSquares::new(identity_line(), 1e-2, 1);
        let mut last = model.cost().unwrap();

        for _ in 0..50 {
            BatchGradientAscent::new().optimize(&mut model).unwrap();
            let cost = model.cost().unwrap();
            assert!(cost <= last + 1e-12, "cost went from {last} to {cost}");
            last = cost;
        }
    }

    #[test]
    fn huge_learning_rate_diverges() {
        let mut model = LeastSquares::new(identity_line(), 1e6, 1000);

        let err = BatchGradientAscent::new().optimize(&mut model).unwrap_err();

        assert!(matches!(err, MlErr::Diverged { .. }));
        assert!(model.theta().iter().all(|t| t.is_finite()));
    }

    #[test]
    fn zero_iterations_still_trains() {
        let mut model = LeastSquares::new(identity_line(), 1e-2, 0);

        BatchGradientAscent::new().optimize(&mut model).unwrap();

        assert!((model.predict(&[10.0]).unwrap() - 10.0).abs() < 0.5);
    }
}
