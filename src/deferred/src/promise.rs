//! Single-resolution awaitable values
//!
//! A [`Promise`] is completed exactly once through its [`Completer`] and may
//! be awaited by any number of consumers; every clone observes the same
//! committed outcome.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::cell::WriteOnce;
use crate::error::{DeferredError, Result};

/// Awaitable, cloneable handle to a value that is committed once
///
/// Dropping a promise mid-await releases its registration on the cell.
pub struct Promise<T> {
    cell: Arc<WriteOnce<T>>,
    waiting: Option<BoxFuture<'static, Result<T>>>,
}

/// Producer side of a [`Promise`] or [`crate::DeferredValue`]
///
/// Completing twice returns [`DeferredError::DoubleCompletion`] and leaves
/// the committed value untouched.
pub struct Completer<T> {
    cell: Arc<WriteOnce<T>>,
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Creates a pending promise together with its completer
    pub fn channel() -> (Self, Completer<T>) {
        let cell = Arc::new(WriteOnce::new());
        (Self::from_cell(Arc::clone(&cell)), Completer { cell })
    }

    /// Creates an already completed promise
    pub fn ready(value: T) -> Self {
        Self::from_cell(Arc::new(WriteOnce::settled(Ok(value))))
    }

    /// Creates an already failed promise
    pub fn failed(err: DeferredError) -> Self {
        Self::from_cell(Arc::new(WriteOnce::settled(Err(err))))
    }

    fn from_cell(cell: Arc<WriteOnce<T>>) -> Self {
        Self {
            cell,
            waiting: None,
        }
    }

    /// Returns the outcome without waiting, if it has been committed
    pub fn try_get(&self) -> Option<Result<T>> {
        self.cell.peek()
    }

    /// Returns `true` once the promise is completed or failed
    pub fn is_settled(&self) -> bool {
        self.cell.is_settled()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            waiting: None,
        }
    }
}

impl<T: Clone + Send + 'static> Future for Promise<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.cell.peek() {
            this.waiting = None;
            return Poll::Ready(outcome);
        }

        let cell = Arc::clone(&this.cell);
        let waiting = this
            .waiting
            .get_or_insert_with(|| async move { cell.wait().await }.boxed());
        let outcome = waiting.as_mut().poll(cx);
        if outcome.is_ready() {
            this.waiting = None;
        }
        outcome
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Completer<T> {
    pub(crate) fn from_cell(cell: Arc<WriteOnce<T>>) -> Self {
        Self { cell }
    }

    /// Commits a value
    pub fn complete(&self, value: T) -> Result<()> {
        self.cell.settle(Ok(value))
    }

    /// Commits a failure
    pub fn fail(&self, err: DeferredError) -> Result<()> {
        self.cell.settle(Err(err))
    }

    /// Commits either outcome
    pub fn settle(&self, outcome: Result<T>) -> Result<()> {
        self.cell.settle(outcome)
    }

    pub fn is_settled(&self) -> bool {
        self.cell.is_settled()
    }
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("settled", &self.is_settled())
            .finish()
    }
}
