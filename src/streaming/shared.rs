use std::sync::Arc;

use parking_lot::RwLock;

/// A shared, read-only view of the state a streaming consumer is training.
///
/// The consumer is the only writer and always publishes whole snapshots, so a
/// reader never observes a partially applied update.
#[derive(Debug)]
pub struct SharedState<S>(Arc<RwLock<S>>);

impl<S> Clone for SharedState<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: Clone> SharedState<S> {
    /// Creates a new `SharedState`.
    ///
    /// # Arguments
    /// * `state` - The state before any update.
    pub fn new(state: S) -> Self {
        Self(Arc::new(RwLock::new(state)))
    }

    /// Returns a copy of the latest published state.
    pub fn snapshot(&self) -> S {
        self.0.read().clone()
    }

    /// Runs `f` over the latest published state without copying it.
    pub fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.0.read())
    }

    pub(crate) fn publish(&self, state: S) {
        *self.0.write() = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_published_state() {
        let shared = SharedState::new(vec![0., 0.]);
        let reader = shared.clone();

        shared.publish(vec![1., 2.]);

        assert_eq!(reader.snapshot(), [1., 2.]);
        assert_eq!(reader.read(|s| s.len()), 2);
    }
}
