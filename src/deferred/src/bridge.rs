//! Bridge from deferred values to awaitable promises
//!
//! `resolve` and `resolve_with` register a one-shot continuation on the
//! source node and complete a fresh [`Promise`] from it. The source chain is
//! left untouched, so downstream consumers of the node keep observing the
//! original value while the promise carries the (possibly transformed) copy.
//!
//! Both [`DeferredValue`] and [`Input`] implement [`IntoFuture`], so
//! sequential code can simply `.await` them.

use std::future::IntoFuture;
use std::time::Duration;
use tracing::{debug, error};

use crate::deferred::{DeferredValue, Input};
use crate::promise::Promise;

impl<T: Clone + Send + 'static> DeferredValue<T> {
    /// Bridges this node into a promise completed with its value
    pub fn resolve(&self) -> Promise<T> {
        self.resolve_with(|value| value)
    }

    /// Bridges this node into a promise completed with `transform(value)`
    ///
    /// The node itself keeps propagating the untransformed value.
    pub fn resolve_with<R, F>(&self, transform: F) -> Promise<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let (promise, completer) = Promise::channel();
        self.subscribe(move |outcome| {
            if let Err(err) = completer.settle(outcome.map(transform)) {
                error!(error = %err, "Bridged promise completed twice");
            }
        });
        promise
    }

    /// Passes the value through unchanged after `duration` has elapsed
    ///
    /// The pause is a timer on the engine's runtime and starts once this
    /// node resolves.
    pub fn delay(&self, duration: Duration) -> DeferredValue<T> {
        self.apply_async(move |value| async move {
            debug!(?duration, "Delaying deferred value");
            tokio::time::sleep(duration).await;
            value
        })
    }
}

impl<T: Clone + Send + 'static> Input<T> {
    /// Bridges this input into a promise
    pub fn resolve(&self) -> Promise<T> {
        match self {
            Input::Value(value) => Promise::ready(value.clone()),
            Input::Deferred(node) => node.resolve(),
        }
    }

    /// Bridges this input into a promise completed with `transform(value)`
    pub fn resolve_with<R, F>(&self, transform: F) -> Promise<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        match self {
            Input::Value(value) => Promise::ready(transform(value.clone())),
            Input::Deferred(node) => node.resolve_with(transform),
        }
    }
}

impl<T: Clone + Send + 'static> IntoFuture for DeferredValue<T> {
    type Output = crate::Result<T>;
    type IntoFuture = Promise<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve()
    }
}

impl<T: Clone + Send + 'static> IntoFuture for &DeferredValue<T> {
    type Output = crate::Result<T>;
    type IntoFuture = Promise<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve()
    }
}

impl<T: Clone + Send + 'static> IntoFuture for Input<T> {
    type Output = crate::Result<T>;
    type IntoFuture = Promise<T>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve()
    }
}
