//! StackBridge Provisioning Library
//!
//! Configuration and role binding used by the `stackbridge-provision`
//! binary.

pub mod config;
pub mod stack;

pub use config::ProvisionConfig;
pub use stack::{bind_roles, role_catalog, RoleBinding};
