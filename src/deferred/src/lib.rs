//! # StackBridge Deferred Values
//!
//! Bridges engine-owned deferred values into ordinary awaitable promises.
//!
//! ## Features
//!
//! - **Write-once nodes**: every value is committed exactly once; a second
//!   completion is reported as [`DeferredError::DoubleCompletion`]
//! - **Continuation chains**: `apply`, `try_apply`, `apply_async` and `then`
//! - **Bridge**: `resolve`, `resolve_with` and `.await` on any node
//! - **Timed pass-through**: `delay` using a non-blocking runtime timer
//!
//! ## Example
//!
//! ```rust
//! use stackbridge_deferred::Engine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::current()?;
//! let (token, completer) = engine.pending::<String>();
//!
//! // Downstream declarations keep the original chain.
//! let header = token.apply(|t| format!("Bearer {t}"));
//!
//! // Sequential code awaits a bridged copy.
//! let length = token.resolve_with(|t| t.len());
//!
//! completer.complete("secret".to_string())?;
//! assert_eq!(length.await?, 6);
//! assert_eq!(header.await?, "Bearer secret");
//! # Ok(())
//! # }
//! ```

pub mod bridge;
mod cell;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod promise;

pub use deferred::{DeferredValue, Input};
pub use engine::Engine;
pub use error::{DeferredError, Result};
pub use promise::{Completer, Promise};
