//! Engine-owned deferred values
//!
//! A [`DeferredValue`] is resolved exactly once by the engine and can only be
//! consumed by registering continuations. Each continuation produces a new
//! node, so chains of `apply` calls mirror the engine's dependency graph.

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;

use crate::cell::{settle_or_report, WriteOnce};
use crate::engine::Engine;
use crate::error::{DeferredError, Result};

/// A value produced once by the engine, consumed via continuations
pub struct DeferredValue<T> {
    cell: Arc<WriteOnce<T>>,
    engine: Engine,
}

impl<T: Clone + Send + 'static> DeferredValue<T> {
    pub(crate) fn from_cell(cell: Arc<WriteOnce<T>>, engine: Engine) -> Self {
        Self { cell, engine }
    }

    /// The engine hosting this node
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns `true` once the engine has resolved or failed this node
    pub fn is_resolved(&self) -> bool {
        self.cell.is_settled()
    }

    /// Registers a one-shot callback receiving the node's outcome
    ///
    /// Runs immediately if the node is already resolved.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.cell.subscribe(Box::new(callback));
    }

    /// Chains a synchronous transformation
    ///
    /// Failures skip `f` and propagate to the new node unchanged.
    pub fn apply<R, F>(&self, f: F) -> DeferredValue<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let next = Arc::new(WriteOnce::new());
        let sink = Arc::clone(&next);
        self.subscribe(move |outcome| settle_or_report(&sink, outcome.map(f)));
        DeferredValue::from_cell(next, self.engine.clone())
    }

    /// Chains a fallible transformation; an `Err` fails the new node
    pub fn try_apply<R, E, F>(&self, f: F) -> DeferredValue<R>
    where
        R: Clone + Send + 'static,
        E: Display,
        F: FnOnce(T) -> std::result::Result<R, E> + Send + 'static,
    {
        let next = Arc::new(WriteOnce::new());
        let sink = Arc::clone(&next);
        self.subscribe(move |outcome| {
            let outcome =
                outcome.and_then(|value| f(value).map_err(|err| DeferredError::failed(err.to_string())));
            settle_or_report(&sink, outcome);
        });
        DeferredValue::from_cell(next, self.engine.clone())
    }

    /// Chains an asynchronous transformation run on the engine's runtime
    pub fn apply_async<R, F, Fut>(&self, f: F) -> DeferredValue<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let next = Arc::new(WriteOnce::new());
        let sink = Arc::clone(&next);
        let engine = self.engine.clone();
        self.subscribe(move |outcome| match outcome {
            Ok(value) => engine.spawn_settling(sink, async move { Ok(f(value).await) }),
            Err(err) => settle_or_report(&sink, Err(err)),
        });
        DeferredValue::from_cell(next, self.engine.clone())
    }

    /// Chains a continuation that itself returns a deferred value
    pub fn then<R, F>(&self, f: F) -> DeferredValue<R>
    where
        R: Clone + Send + 'static,
        F: FnOnce(T) -> DeferredValue<R> + Send + 'static,
    {
        let next = Arc::new(WriteOnce::new());
        let sink = Arc::clone(&next);
        self.subscribe(move |outcome| match outcome {
            Ok(value) => f(value).subscribe(move |inner| settle_or_report(&sink, inner)),
            Err(err) => settle_or_report(&sink, Err(err)),
        });
        DeferredValue::from_cell(next, self.engine.clone())
    }
}

impl<T> Clone for DeferredValue<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            engine: self.engine.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for DeferredValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A declaration input: either a plain value or an engine-owned node
#[derive(Clone, Debug)]
pub enum Input<T: Clone + Send + 'static> {
    Value(T),
    Deferred(DeferredValue<T>),
}

impl<T: Clone + Send + 'static> Input<T> {
    pub fn value(value: T) -> Self {
        Input::Value(value)
    }

    /// Converts the input into a node hosted by `engine`
    pub fn into_deferred(self, engine: &Engine) -> DeferredValue<T> {
        match self {
            Input::Value(value) => engine.ready(value),
            Input::Deferred(node) => node,
        }
    }
}

impl<T: Clone + Send + 'static> From<DeferredValue<T>> for Input<T> {
    fn from(node: DeferredValue<T>) -> Self {
        Input::Deferred(node)
    }
}
