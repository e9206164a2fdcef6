use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire toolkit.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The toolkit's error type.
#[derive(Debug)]
pub enum MlErr {
    /// A parameter became `±Inf` or `NaN` after an update.
    Diverged { iteration: usize, coordinate: usize },
    /// A feature vector or restored state doesn't match the model's dimensionality.
    DimensionMismatch { got: usize, expected: usize },
    /// The training set has no examples or the examples have no features.
    EmptyDataset,
    /// A configuration value was rejected before any work began.
    InvalidConfig(String),
    /// The model has no learned state to predict or stream with yet.
    NotFitted,
    /// A model state couldn't be (de)serialized.
    Persistence(serde_json::Error),
}

impl MlErr {
    /// Whether this error ends a training run in the streaming protocol
    /// regardless of the configured divergence policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MlErr::InvalidConfig(_) | MlErr::EmptyDataset | MlErr::NotFitted
        )
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Diverged {
                iteration,
                coordinate,
            } => write!(
                f,
                "learning diverged at iteration {iteration}: parameter {coordinate} is ±Inf or NaN"
            ),
            MlErr::DimensionMismatch { got, expected } => write!(
                f,
                "dimension mismatch: got {got} features and expected {expected}"
            ),
            MlErr::EmptyDataset => f.write_str("the training set is empty or has no features"),
            MlErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            MlErr::NotFitted => f.write_str("the model must be fitted first"),
            MlErr::Persistence(e) => write!(f, "persistence error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MlErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Persistence(value)
    }
}
