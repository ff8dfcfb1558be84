//! Host for deferred values
//!
//! The engine owns node creation and the executor that asynchronous
//! continuations run on. It never drives a scheduling loop of its own:
//! spawned work goes to the tokio runtime the engine was created from.

use futures::FutureExt;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::cell::{settle_or_report, WriteOnce};
use crate::deferred::DeferredValue;
use crate::error::{DeferredError, Result};
use crate::promise::Completer;

/// Creates deferred values and hosts their asynchronous continuations
#[derive(Clone, Debug)]
pub struct Engine {
    handle: Handle,
}

impl Engine {
    /// Creates an engine bound to the given runtime
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates an engine bound to the runtime of the calling task
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| DeferredError::NoRuntime)
    }

    /// Creates an unresolved node and the completer that resolves it
    pub fn pending<T: Clone + Send + 'static>(&self) -> (DeferredValue<T>, Completer<T>) {
        let cell = Arc::new(WriteOnce::new());
        (
            DeferredValue::from_cell(Arc::clone(&cell), self.clone()),
            Completer::from_cell(cell),
        )
    }

    /// Creates a node that is already resolved
    pub fn ready<T: Clone + Send + 'static>(&self, value: T) -> DeferredValue<T> {
        DeferredValue::from_cell(Arc::new(WriteOnce::settled(Ok(value))), self.clone())
    }

    /// Creates a node that has already failed
    pub fn failed<T: Clone + Send + 'static>(&self, err: DeferredError) -> DeferredValue<T> {
        DeferredValue::from_cell(Arc::new(WriteOnce::settled(Err(err))), self.clone())
    }

    /// Exposes the result of an ordinary future as a deferred value
    ///
    /// The future is spawned on the engine's runtime immediately. An error
    /// fails the node with its display text, and so does a panic.
    pub fn create<T, E, F>(&self, future: F) -> DeferredValue<T>
    where
        T: Clone + Send + 'static,
        E: Display + Send + 'static,
        F: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let cell = Arc::new(WriteOnce::new());
        let node = DeferredValue::from_cell(Arc::clone(&cell), self.clone());

        self.spawn_settling(
            cell,
            future.map(|outcome| {
                outcome.map_err(|err| {
                    debug!(error = %err, "Deferred producer failed");
                    DeferredError::failed(err.to_string())
                })
            }),
        );

        node
    }

    /// Runs `future` on the engine's runtime and commits its outcome to `cell`
    ///
    /// A panicking producer fails the cell, so awaiters never hang on it.
    pub(crate) fn spawn_settling<T, F>(&self, cell: Arc<WriteOnce<T>>, future: F)
    where
        T: Clone + Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        // Detached: completion is observed through the node, not the handle.
        drop(self.handle.spawn(async move {
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(panic = %message, "Deferred producer panicked");
                    Err(DeferredError::failed(format!("producer panicked: {message}")))
                }
            };
            settle_or_report(&cell, outcome);
        }));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
