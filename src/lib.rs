pub mod clustering;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod optimization;
pub mod persist;
pub mod streaming;

pub use config::{DivergencePolicy, TrainingConfig};
pub use dataset::{Datapoint, Dataset};
pub use error::{MlErr, Result};
pub use persist::Persist;
