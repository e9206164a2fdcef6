use crate::{dataset::Datapoint, error::Result, persist::Persist};

/// A model that can learn from one point at a time.
pub trait OnlineModel: Persist + Send + 'static {
    /// The amount of features every incoming point must have.
    fn dimensions(&self) -> usize;

    /// The amount of labels every incoming point must have, `None` if labels are ignored.
    fn label_dimensions(&self) -> Option<usize>;

    /// Updates the model's state with a single point whose dimensions were already validated.
    ///
    /// Implementations must leave the state untouched whenever they return an error.
    ///
    /// # Arguments
    /// * `point` - The incoming point.
    /// * `index` - The point's position in the stream, used for error reporting.
    fn learn(&mut self, point: &Datapoint, index: usize) -> Result<()>;
}
