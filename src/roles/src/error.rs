//! Error types for role definition resolution

use chrono::{DateTime, Utc};
use stackbridge_deferred::DeferredError;
use thiserror::Error;

/// Role resolution errors
#[derive(Debug, Error)]
pub enum RoleError {
    /// Token validity window elapsed before the catalog was drained
    #[error("Bearer token expired at {expired_at}")]
    TokenExpired { expired_at: DateTime<Utc> },

    /// Transport or server failure while fetching a page
    #[error("Page fetch failed: {0}")]
    PageFetchFailed(String),

    /// Catalog rejected the credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Catalog returned a payload that cannot be used
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),

    /// Requested role name is not in the catalog
    #[error("Role definition not found: {0}")]
    NameNotFound(String),

    /// Requested role name maps to several identifiers and duplicates are rejected
    #[error("Role name '{name}' is ambiguous ({count} definitions)")]
    AmbiguousName { name: String, count: usize },

    /// Token value failed upstream
    #[error("Token unavailable: {0}")]
    Token(#[from] DeferredError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for role resolution
pub type Result<T> = std::result::Result<T, RoleError>;
