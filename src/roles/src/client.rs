//! Authenticated catalog client
//!
//! Binds a role definition source to one bearer token and refuses to issue
//! requests once the token's validity window has elapsed.

use futures::stream::{self, Stream};
use std::sync::Arc;
use tracing::warn;

use crate::error::{Result, RoleError};
use crate::source::RoleDefinitionSource;
use crate::token::{BearerToken, Clock};
use crate::types::{ContinuationToken, Page, RoleDefinition};

enum Cursor {
    Start,
    Next(ContinuationToken),
    Done,
}

/// Catalog client scoped to a single token
pub struct AuthenticatedClient {
    source: Arc<dyn RoleDefinitionSource>,
    token: BearerToken,
    clock: Arc<dyn Clock>,
}

impl AuthenticatedClient {
    pub fn new(source: Arc<dyn RoleDefinitionSource>, token: BearerToken, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            token,
            clock,
        }
    }

    /// Fails with `TokenExpired` once the token's window has elapsed
    pub fn ensure_valid(&self) -> Result<()> {
        if self.token.is_expired_at(self.clock.now()) {
            warn!(expired_at = %self.token.expires_at(), "Bearer token expired");
            return Err(RoleError::TokenExpired {
                expired_at: self.token.expires_at(),
            });
        }
        Ok(())
    }

    /// Fetches a single page after checking the token window
    pub async fn fetch_page(
        &self,
        scope: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<Page<RoleDefinition>> {
        self.ensure_valid()?;
        self.source.fetch_page(&self.token, scope, continuation).await
    }

    /// Streams every page under `scope` until the terminal page
    ///
    /// A page whose continuation marker repeats the one used to fetch it
    /// ends the stream with `InvalidResponse`.
    pub fn pages<'a>(&'a self, scope: &'a str) -> impl Stream<Item = Result<Page<RoleDefinition>>> + Send + 'a {
        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let current = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            let page = self.fetch_page(scope, current.as_ref()).await?;

            let next = match (&page.next, &current) {
                (Some(next), Some(current)) if next == current => {
                    return Err(RoleError::InvalidResponse(format!(
                        "Continuation marker '{}' repeated",
                        next.as_str()
                    )));
                }
                (Some(next), _) => Cursor::Next(next.clone()),
                (None, _) => Cursor::Done,
            };

            Ok::<_, RoleError>(Some((page, next)))
        })
    }
}
