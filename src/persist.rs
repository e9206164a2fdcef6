use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// Access to a model's learned numeric state.
///
/// Linear models expose their parameter vector as a flat array, clustering
/// models their centroids as a nested one.
pub trait Persist {
    type State: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// A copy of the current state.
    fn state(&self) -> Self::State;

    /// Replaces the current state.
    ///
    /// # Returns
    /// `MlErr::DimensionMismatch` if `state` doesn't have the model's shape.
    fn restore(&mut self, state: Self::State) -> Result<()>;

    /// Serializes the current state as JSON.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.state())?)
    }

    /// Replaces the current state with one serialized as JSON.
    fn restore_json(&mut self, json: &str) -> Result<()> {
        let state = serde_json::from_str(json)?;
        self.restore(state)
    }
}
