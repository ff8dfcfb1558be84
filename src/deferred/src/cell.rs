//! Write-once cell shared by deferred values and promises
//!
//! A cell starts `Pending` with a list of one-shot continuations. Settling it
//! moves it to `Completed` or `Failed` exactly once; continuations run
//! outside the lock and suspended awaiters are woken through a [`Notify`].
//! An abandoned awaiter deregisters itself when its future is dropped.

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::error;

use crate::error::{DeferredError, Result};

/// One-shot callback invoked with the settled outcome
pub(crate) type Continuation<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

enum State<T> {
    Pending { continuations: Vec<Continuation<T>> },
    Completed(T),
    Failed(DeferredError),
}

pub(crate) struct WriteOnce<T> {
    state: Mutex<State<T>>,
    settled: Notify,
}

impl<T: Clone + Send + 'static> WriteOnce<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending {
                continuations: Vec::new(),
            }),
            settled: Notify::new(),
        }
    }

    /// Creates a cell that is already settled
    pub(crate) fn settled(outcome: Result<T>) -> Self {
        let state = match outcome {
            Ok(value) => State::Completed(value),
            Err(err) => State::Failed(err),
        };
        Self {
            state: Mutex::new(state),
            settled: Notify::new(),
        }
    }

    /// Commits the outcome, failing with `DoubleCompletion` if already settled
    pub(crate) fn settle(&self, outcome: Result<T>) -> Result<()> {
        let mut state = self.state.lock();
        let State::Pending { continuations } = &mut *state else {
            return Err(DeferredError::DoubleCompletion);
        };

        let continuations = std::mem::take(continuations);
        *state = match &outcome {
            Ok(value) => State::Completed(value.clone()),
            Err(err) => State::Failed(err.clone()),
        };
        drop(state);

        self.settled.notify_waiters();
        for continuation in continuations {
            continuation(outcome.clone());
        }

        Ok(())
    }

    /// Registers a continuation; runs it immediately if already settled
    pub(crate) fn subscribe(&self, continuation: Continuation<T>) {
        let outcome = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { continuations, .. } => {
                    continuations.push(continuation);
                    return;
                }
                State::Completed(value) => Ok(value.clone()),
                State::Failed(err) => Err(err.clone()),
            }
        };
        continuation(outcome);
    }

    /// Waits for the outcome without consuming it
    pub(crate) async fn wait(&self) -> Result<T> {
        loop {
            // Registered before the state check so a concurrent settle is not missed.
            let notified = self.settled.notified();
            if let Some(outcome) = self.peek() {
                return outcome;
            }
            notified.await;
        }
    }

    pub(crate) fn peek(&self) -> Option<Result<T>> {
        match &*self.state.lock() {
            State::Pending { .. } => None,
            State::Completed(value) => Some(Ok(value.clone())),
            State::Failed(err) => Some(Err(err.clone())),
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        !matches!(&*self.state.lock(), State::Pending { .. })
    }
}

/// Settles a cell owned by a bridge continuation.
///
/// These cells have exactly one writer, so a failure here is a logic error
/// in the caller and is reported rather than dropped.
pub(crate) fn settle_or_report<T: Clone + Send + 'static>(cell: &WriteOnce<T>, outcome: Result<T>) {
    if let Err(err) = cell.settle(outcome) {
        error!(error = %err, "Bridge continuation settled a value twice");
    }
}
