use std::sync::Arc;

use log::{debug, info, warn};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle, JoinSet},
};

use super::{OnlineModel, SharedState};
use crate::{
    config::DivergencePolicy,
    dataset::Datapoint,
    error::{MlErr, Result},
};

/// A snapshot of the model's state right after an update was committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Update<S> {
    /// The commit order of this update, starting at `1`.
    pub seq: u64,
    pub state: S,
}

/// What's left once the consumer stops.
#[derive(Debug)]
pub struct Completion<M> {
    pub model: M,
    /// Points that were validated and committed.
    pub processed: usize,
    /// Points that were rejected or whose update was dropped.
    pub skipped: usize,
    /// Whether the consumer stopped before the queue was closed and drained.
    pub aborted: bool,
}

type Callback<S> = Arc<dyn Fn(Update<S>) + Send + Sync>;

/// Trains an `OnlineModel` from a stream of points.
///
/// The model is moved into a dedicated task which is its only writer. Every
/// committed update is published to a `SharedState` for concurrent readers and
/// handed to the update callback on the blocking pool, so a slow callback never
/// stalls ingestion.
pub struct OnlineLearner<M: OnlineModel> {
    model: M,
    divergence: DivergencePolicy,
    on_update: Option<Callback<M::State>>,
}

impl<M: OnlineModel> OnlineLearner<M> {
    /// Creates a new `OnlineLearner`.
    ///
    /// # Arguments
    /// * `model` - The model to train.
    pub fn new(model: M) -> Self {
        Self {
            model,
            divergence: DivergencePolicy::default(),
            on_update: None,
        }
    }

    /// Sets what happens when an update diverges.
    pub fn divergence(mut self, policy: DivergencePolicy) -> Self {
        self.divergence = policy;
        self
    }

    /// Sets the callback invoked with a copy of the state after every committed update.
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(Update<M::State>) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// Starts consuming `data` on a new task. Must be called within a Tokio runtime.
    ///
    /// The consumer stops once every sender of `data` is dropped and the queue
    /// is drained, or earlier if an error is fatal under the divergence policy.
    ///
    /// # Arguments
    /// * `data` - The receiving end of the point queue.
    ///
    /// # Returns
    /// The `Session` to observe the training through.
    pub fn spawn(self, data: mpsc::Receiver<Datapoint>) -> Session<M> {
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let shared = SharedState::new(self.model.state());

        let consumer = Consumer {
            model: self.model,
            divergence: self.divergence,
            on_update: self.on_update,
            shared: shared.clone(),
            errors: err_tx,
        };

        Session {
            errors: err_rx,
            shared,
            handle: tokio::spawn(consumer.run(data)),
        }
    }
}

/// A running streaming training.
pub struct Session<M: OnlineModel> {
    errors: mpsc::UnboundedReceiver<MlErr>,
    shared: SharedState<M::State>,
    handle: JoinHandle<Completion<M>>,
}

impl<M: OnlineModel> Session<M> {
    /// Waits for the next reported error.
    ///
    /// # Returns
    /// `None` once the consumer has stopped and every error was received.
    pub async fn next_error(&mut self) -> Option<MlErr> {
        self.errors.recv().await
    }

    /// Receives every error until the consumer stops.
    pub async fn drain_errors(&mut self) -> Vec<MlErr> {
        let mut errors = Vec::new();

        while let Some(e) = self.errors.recv().await {
            errors.push(e);
        }

        errors
    }

    /// A handle to read the latest committed state while training is in progress.
    pub fn shared(&self) -> SharedState<M::State> {
        self.shared.clone()
    }

    /// Waits for the consumer to stop and takes the trained model back.
    ///
    /// # Returns
    /// A `JoinError` if the consumer panicked.
    pub async fn join(self) -> std::result::Result<Completion<M>, JoinError> {
        self.handle.await
    }
}

struct Consumer<M: OnlineModel> {
    model: M,
    divergence: DivergencePolicy,
    on_update: Option<Callback<M::State>>,
    shared: SharedState<M::State>,
    errors: mpsc::UnboundedSender<MlErr>,
}

impl<M: OnlineModel> Consumer<M> {
    async fn run(mut self, mut data: mpsc::Receiver<Datapoint>) -> Completion<M> {
        let mut callbacks = JoinSet::new();
        let mut index = 0;
        let mut seq = 0;
        let mut processed = 0;
        let mut skipped = 0;
        let mut aborted = false;

        while let Some(point) = data.recv().await {
            let current = index;
            index += 1;

            if let Err(e) = self.validate(&point) {
                warn!(index = current; "skipping point: {e}");
                skipped += 1;
                self.report(e);
                continue;
            }

            if let Err(e) = self.model.learn(&point, current) {
                warn!(index = current; "dropping update: {e}");
                skipped += 1;

                let fatal = self.is_fatal(&e);
                self.report(e);

                if fatal {
                    aborted = true;
                    data.close();
                    break;
                }

                continue;
            }

            processed += 1;
            seq += 1;

            let state = self.model.state();
            self.shared.publish(state.clone());

            if let Some(on_update) = &self.on_update {
                let on_update = Arc::clone(on_update);
                callbacks.spawn_blocking(move || on_update(Update { seq, state }));
            }

            while let Some(res) = callbacks.try_join_next() {
                log_callback(res);
            }
        }

        while let Some(res) = callbacks.join_next().await {
            log_callback(res);
        }

        info!(processed = processed, skipped = skipped, aborted = aborted; "online training finished");

        Completion {
            model: self.model,
            processed,
            skipped,
            aborted,
        }
    }

    fn validate(&self, point: &Datapoint) -> Result<()> {
        let expected = self.model.dimensions();

        if point.x.len() != expected {
            return Err(MlErr::DimensionMismatch {
                got: point.x.len(),
                expected,
            });
        }

        match self.model.label_dimensions() {
            Some(expected) if point.y.len() != expected => Err(MlErr::DimensionMismatch {
                got: point.y.len(),
                expected,
            }),
            _ => Ok(()),
        }
    }

    fn is_fatal(&self, err: &MlErr) -> bool {
        match err {
            MlErr::Diverged { .. } => self.divergence == DivergencePolicy::Abort,
            other => other.is_fatal(),
        }
    }

    fn report(&self, err: MlErr) {
        if self.errors.send(err).is_err() {
            debug!("error receiver dropped, the error is discarded");
        }
    }
}

fn log_callback(res: std::result::Result<(), JoinError>) {
    if let Err(e) = res {
        warn!("update callback failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::LeastSquares, persist::Persist};

    #[tokio::test]
    async fn closing_the_queue_completes_the_session() {
        let (tx, rx) = mpsc::channel(4);
        let mut session = OnlineLearner::new(LeastSquares::online(1, 1e-1)).spawn(rx);

        tx.send(Datapoint::new(vec![1.], vec![1.])).await.unwrap();
        drop(tx);

        assert!(session.drain_errors().await.is_empty());

        let done = session.join().await.unwrap();
        assert_eq!(done.processed, 1);
        assert!(!done.aborted);
        assert_ne!(done.model.state(), [0., 0.]);
    }

    #[tokio::test]
    async fn wrong_label_count_is_rejected() {
        let (tx, rx) = mpsc::channel(4);
        let mut session = OnlineLearner::new(LeastSquares::online(1, 1e-1)).spawn(rx);

        tx.send(Datapoint::new(vec![1.], vec![1., 2.])).await.unwrap();
        drop(tx);

        let errors = session.drain_errors().await;
        assert!(matches!(
            errors.as_slice(),
            [MlErr::DimensionMismatch {
                got: 2,
                expected: 1
            }]
        ));

        let done = session.join().await.unwrap();
        assert_eq!(done.skipped, 1);
        assert_eq!(done.model.state(), [0., 0.]);
    }
}
