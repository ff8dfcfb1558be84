//! Paginated role definition sources

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, RoleError};
use crate::token::BearerToken;
use crate::types::{ContinuationToken, Page, RoleDefinition};

/// Read-only, paginated listing of role definitions
#[async_trait]
pub trait RoleDefinitionSource: Send + Sync {
    /// Fetches one page under `scope`; `continuation` is `None` for the first page
    async fn fetch_page(
        &self,
        token: &BearerToken,
        scope: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<RoleDefinition>>;
}

/// Fixed set of pages held in memory
///
/// Continuation markers are page indexes. Used for tests and for running
/// the provisioning tool against a recorded catalog.
#[derive(Debug, Default)]
pub struct InMemoryRoleSource {
    pages: Vec<Vec<RoleDefinition>>,
    fail_at: Option<(usize, String)>,
    requests: AtomicUsize,
}

impl InMemoryRoleSource {
    pub fn new(pages: Vec<Vec<RoleDefinition>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Parses pages from JSON: an array of pages, each an array of
    /// `{ "name": ..., "id": ... }` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let pages: Vec<Vec<RoleDefinition>> = serde_json::from_str(json)
            .map_err(|e| RoleError::Configuration(format!("Invalid catalog fixture: {}", e)))?;
        Ok(Self::new(pages))
    }

    /// Makes the request for page `index` fail with `PageFetchFailed`
    pub fn with_failure_at(mut self, index: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((index, message.into()));
        self
    }

    /// Number of page requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn page_index(continuation: Option<&ContinuationToken>) -> Result<usize> {
        match continuation {
            None => Ok(0),
            Some(token) => token.as_str().parse().map_err(|_| {
                RoleError::InvalidResponse(format!("Unknown continuation marker '{}'", token.as_str()))
            }),
        }
    }
}

#[async_trait]
impl RoleDefinitionSource for InMemoryRoleSource {
    async fn fetch_page(
        &self,
        _token: &BearerToken,
        _scope: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<RoleDefinition>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let index = Self::page_index(continuation)?;

        if let Some((fail_index, message)) = &self.fail_at {
            if *fail_index == index {
                return Err(RoleError::PageFetchFailed(message.clone()));
            }
        }

        // An empty catalog still answers the first request with a terminal page.
        let items = match self.pages.get(index) {
            Some(items) => items.clone(),
            None if index == 0 => Vec::new(),
            None => {
                return Err(RoleError::InvalidResponse(format!(
                    "Continuation marker {} is past the last page",
                    index
                )))
            }
        };

        let next = index + 1;
        if next < self.pages.len() {
            Ok(Page::with_next(items, ContinuationToken::new(next.to_string())))
        } else {
            Ok(Page::terminal(items))
        }
    }
}
