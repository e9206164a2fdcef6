use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MlErr, Result},
    optimization::OptimizationMethod,
};

/// What the streaming consumer does when an update diverges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergencePolicy {
    /// Report the divergence, drop that update and keep consuming.
    #[default]
    Report,
    /// Report the divergence and stop consuming.
    Abort,
}

/// The training configuration, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    #[serde(default)]
    pub max_iterations: usize,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub regularization: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub divergence: DivergencePolicy,
}

fn default_method() -> String {
    OptimizationMethod::Batch.to_string()
}

impl TrainingConfig {
    /// Parses and validates a configuration.
    ///
    /// # Arguments
    /// * `json` - The JSON representation of the configuration.
    ///
    /// # Returns
    /// `MlErr::InvalidConfig` if any value is rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value before any work begins.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0. {
            return Err(MlErr::InvalidConfig(format!(
                "the learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if !self.regularization.is_finite() || self.regularization < 0. {
            return Err(MlErr::InvalidConfig(format!(
                "the regularization must be non negative, got {}",
                self.regularization
            )));
        }

        self.method()?;
        Ok(())
    }

    /// Resolves the optimization method selector.
    pub fn method(&self) -> Result<OptimizationMethod> {
        self.method.parse()
    }

    /// Creates the random number generator for this run.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            max_iterations: 0,
            method: default_method(),
            regularization: 0.,
            seed: None,
            divergence: DivergencePolicy::default(),
        }
    }
}
