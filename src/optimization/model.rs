/// The capabilities shared by every model an optimizer can train.
///
/// Index `0` of the parameter vector is the bias term.
pub trait Trainable {
    /// The *length* of the steps taken on every update.
    fn learning_rate(&self) -> f64;

    /// The iteration cap, `0` meaning the optimizer's default.
    fn max_iterations(&self) -> usize;

    /// The amount of training examples the model owns.
    fn examples(&self) -> usize;

    /// The parameter vector.
    fn theta(&self) -> &[f64];

    /// The parameter vector, only ever written by the optimizer training the model.
    fn theta_mut(&mut self) -> &mut [f64];

    /// The scalar cost over the whole training set, if the model can compute one.
    fn cost(&self) -> Option<f64> {
        None
    }
}

/// A model optimizable with whole-dataset gradient steps.
pub trait GradientModel: Trainable {
    /// The gradient of the objective with respect to `θ[j]` over every training example,
    /// evaluated at the current parameters.
    fn dj(&self, j: usize) -> f64;
}

/// A model optimizable with one-example-at-a-time gradient steps.
pub trait StochasticGradientModel: Trainable {
    /// The gradient of the objective with respect to `θ[j]` at the `i`-th example only,
    /// evaluated at the current parameters.
    fn dij(&self, i: usize, j: usize) -> f64;
}
