mod batch;
mod method;
mod model;
mod stochastic;

pub use batch::BatchGradientAscent;
pub use method::OptimizationMethod;
pub use model::{GradientModel, StochasticGradientModel, Trainable};
pub use stochastic::StochasticGradientAscent;

use crate::error::{MlErr, Result};

/// The iteration cap used whenever a model reports `0` iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 250;

/// Resolves the iteration cap a model asked for.
pub fn resolve_iterations(max_iterations: usize) -> usize {
    match max_iterations {
        0 => DEFAULT_MAX_ITERATIONS,
        n => n,
    }
}

/// Makes one ascent step on every coordinate of `model`'s parameters.
///
/// Every coordinate is computed against the parameters as they were before the
/// step and then committed at once. A non finite coordinate aborts the step
/// before anything is committed.
///
/// # Arguments
/// * `model` - The model whose parameters will be updated.
/// * `next` - A scratch buffer for the candidate parameters.
/// * `iteration` - The iteration number, only used for error reporting.
/// * `gradient` - The gradient of the objective for a given coordinate.
pub(crate) fn ascend<M, G>(
    model: &mut M,
    next: &mut Vec<f64>,
    iteration: usize,
    gradient: G,
) -> Result<()>
where
    M: Trainable + ?Sized,
    G: Fn(&M, usize) -> f64,
{
    let alpha = model.learning_rate();
    next.clear();

    for (j, &theta) in model.theta().iter().enumerate() {
        let value = theta + alpha * gradient(model, j);

        if !value.is_finite() {
            return Err(MlErr::Diverged {
                iteration,
                coordinate: j,
            });
        }

        next.push(value);
    }

    model.theta_mut().copy_from_slice(next);
    Ok(())
}

/// Rejects models that have nothing to train on.
fn ensure_trainable<M: Trainable + ?Sized>(model: &M) -> Result<()> {
    if model.theta().is_empty() || model.examples() == 0 {
        return Err(MlErr::EmptyDataset);
    }

    Ok(())
}
