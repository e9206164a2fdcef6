use std::{fmt, str::FromStr};

use super::{BatchGradientAscent, GradientModel, StochasticGradientAscent, StochasticGradientModel};
use crate::error::{MlErr, Result};

/// Selects which optimizer trains a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationMethod {
    Batch,
    Stochastic,
}

impl OptimizationMethod {
    /// Trains `model` with the selected optimizer.
    ///
    /// # Arguments
    /// * `model` - A model exposing both gradient forms.
    pub fn optimize<M>(self, model: &mut M) -> Result<()>
    where
        M: GradientModel + StochasticGradientModel,
    {
        match self {
            OptimizationMethod::Batch => BatchGradientAscent::new().optimize(model),
            OptimizationMethod::Stochastic => StochasticGradientAscent::new().optimize(model),
        }
    }
}

impl FromStr for OptimizationMethod {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "batch" | "batchGA" => Ok(Self::Batch),
            "stochastic" | "stochasticGA" => Ok(Self::Stochastic),
            other => Err(MlErr::InvalidConfig(format!(
                "unknown optimization method {other:?}, expected \"batch\" or \"stochastic\""
            ))),
        }
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationMethod::Batch => f.write_str("batch"),
            OptimizationMethod::Stochastic => f.write_str("stochastic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_selectors() {
        assert_eq!("batch".parse::<OptimizationMethod>().unwrap(), OptimizationMethod::Batch);
        assert_eq!(
            "stochasticGA".parse::<OptimizationMethod>().unwrap(),
            OptimizationMethod::Stochastic
        );
    }

    #[test]
    fn rejects_unknown_selectors() {
        let err = "newton".parse::<OptimizationMethod>().unwrap_err();
        assert!(matches!(err, MlErr::InvalidConfig(_)));
    }
}
