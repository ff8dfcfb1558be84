//! Catalog entry and paging types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque role definition identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleDefinitionId(String);

impl RoleDefinitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleDefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single catalog entry; names are not unique across the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub id: RoleDefinitionId,
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: RoleDefinitionId::new(id),
        }
    }
}

/// Marker pointing at the next page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A finite batch of items plus a continuation marker, or `None` on the
/// terminal page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub fn terminal(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn with_next(items: Vec<T>, next: ContinuationToken) -> Self {
        Self {
            items,
            next: Some(next),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }
}
