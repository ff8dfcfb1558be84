//! Error types for deferred values and promises

use thiserror::Error;

/// Result type for deferred value operations
pub type Result<T> = std::result::Result<T, DeferredError>;

/// Deferred value errors
///
/// Errors are `Clone` because a single failure is delivered to every
/// continuation and every awaiter of the failed value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeferredError {
    /// A value was completed a second time
    #[error("Value already completed")]
    DoubleCompletion,

    /// The producer of the value failed
    #[error("Upstream failure: {0}")]
    Failed(String),

    /// No tokio runtime is available to host the engine
    #[error("No async runtime available")]
    NoRuntime,
}

impl DeferredError {
    /// Create an upstream failure
    pub fn failed<S: Into<String>>(msg: S) -> Self {
        DeferredError::Failed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeferredError::failed("page fetch failed");
        assert_eq!(err.to_string(), "Upstream failure: page fetch failed");

        let err = DeferredError::DoubleCompletion;
        assert_eq!(err.to_string(), "Value already completed");
    }
}
