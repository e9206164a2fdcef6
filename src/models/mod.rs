mod linear;
mod logistic;

pub use linear::LeastSquares;
pub use logistic::Logistic;

use crate::error::{MlErr, Result};

/// Computes `θ · [1, x]`, validating that `x` has one value less than `theta`.
///
/// # Arguments
/// * `theta` - The parameter vector, bias first.
/// * `x` - The feature vector.
pub fn weighted_sum(theta: &[f64], x: &[f64]) -> Result<f64> {
    let expected = theta.len().saturating_sub(1);

    if x.len() != expected {
        return Err(MlErr::DimensionMismatch {
            got: x.len(),
            expected,
        });
    }

    Ok(dot(theta, x))
}

/// The logistic function.
pub fn sigmoid(z: f64) -> f64 {
    1. / (1. + (-z).exp())
}

fn dot(theta: &[f64], x: &[f64]) -> f64 {
    theta[0] + theta[1..].iter().zip(x).map(|(t, x)| t * x).sum::<f64>()
}

/// The `j`-th feature of `x`, with the bias feature fixed at `1`.
fn feature(x: &[f64], j: usize) -> f64 {
    match j {
        0 => 1.,
        j => x[j - 1],
    }
}

/// The L2 penalty gradient, the bias is never penalized.
fn penalty(theta: &[f64], regularization: f64, j: usize) -> f64 {
    match j {
        0 => 0.,
        j => regularization * theta[j],
    }
}
