//! Online learning from an unbounded stream of points.
//!
//! A producer pushes `Datapoint`s into a `tokio::sync::mpsc` queue, a single
//! consumer task validates each point and commits one update per point, in
//! arrival order. Errors travel through a separate channel which closes once
//! the consumer stops, so draining it until it closes is how a caller knows the
//! training finished. Dropping every sender of the queue is the only way to
//! stop a healthy consumer.
//!
//! Malformed points are reported and skipped. A diverged update is reported
//! and dropped, and the consumer either keeps going or stops depending on the
//! `DivergencePolicy`.

mod learner;
mod model;
mod shared;

pub use learner::{Completion, OnlineLearner, Session, Update};
pub use model::OnlineModel;
pub use shared::SharedState;
