//! # StackBridge Role Resolution
//!
//! Translates human-readable role names into role definition identifiers.
//!
//! ## Features
//!
//! - **Pagination**: drains the role definition catalog page by page
//! - **Duplicate tolerance**: every identifier is kept under its name, in
//!   catalog order
//! - **Token windows**: requests stop with `TokenExpired` once the bearer
//!   token's validity has elapsed
//! - **Deferred integration**: token in and lookup out as deferred values
//!
//! ## Example
//!
//! ```rust
//! use stackbridge_deferred::Engine;
//! use stackbridge_roles::{InMemoryRoleSource, ResolverContext, RoleDefinition, RoleResolver};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::current()?;
//! let source = InMemoryRoleSource::new(vec![vec![RoleDefinition::new("Reader", "R1")]]);
//! let resolver = RoleResolver::new(Arc::new(source), ResolverContext::default());
//!
//! let token = engine.ready("access-token".to_string());
//! let roles = resolver.role_definitions(&token);
//!
//! let reader = roles.try_apply(|lookup| lookup.first("Reader").map(|id| id.to_string()));
//! assert_eq!(reader.await?, "R1");
//! # Ok(())
//! # }
//! ```

pub mod arm;
pub mod client;
pub mod error;
pub mod lookup;
pub mod resolver;
pub mod source;
pub mod token;
pub mod types;

pub use arm::ArmRoleDefinitionSource;
pub use client::AuthenticatedClient;
pub use error::{Result, RoleError};
pub use lookup::{DuplicatePolicy, RoleLookup};
pub use resolver::{ResolverContext, RoleResolver};
pub use source::{InMemoryRoleSource, RoleDefinitionSource};
pub use token::{BearerToken, Clock, ManualClock, SystemClock};
pub use types::{ContinuationToken, Page, RoleDefinition, RoleDefinitionId};
