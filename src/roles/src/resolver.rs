//! Role definition catalog resolver
//!
//! Drains the paginated catalog with a bridged bearer token and builds the
//! name-indexed [`RoleLookup`]. The lookup is only produced once every page
//! has been consumed; a failure at any point fails the whole resolution.

use chrono::Duration;
use futures::TryStreamExt;
use stackbridge_deferred::DeferredValue;
use std::future::IntoFuture;
use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::AuthenticatedClient;
use crate::error::Result;
use crate::lookup::RoleLookup;
use crate::source::RoleDefinitionSource;
use crate::token::{BearerToken, Clock, SystemClock};

/// Scope at the root of the catalog
pub const ROOT_SCOPE: &str = "/";

/// Default validity assumed for a freshly issued token
pub const DEFAULT_TOKEN_VALIDITY_SECS: i64 = 3600;

/// Session state the resolver runs with
#[derive(Clone)]
pub struct ResolverContext {
    /// Catalog scope to list under
    pub scope: String,
    /// Validity window applied to raw token strings
    pub token_validity: Duration,
    /// Time source for expiry checks
    pub clock: Arc<dyn Clock>,
}

impl Default for ResolverContext {
    fn default() -> Self {
        Self {
            scope: ROOT_SCOPE.to_string(),
            token_validity: Duration::seconds(DEFAULT_TOKEN_VALIDITY_SECS),
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverContext")
            .field("scope", &self.scope)
            .field("token_validity", &self.token_validity)
            .finish_non_exhaustive()
    }
}

/// Builds role lookups from a paginated catalog
#[derive(Clone)]
pub struct RoleResolver {
    source: Arc<dyn RoleDefinitionSource>,
    context: ResolverContext,
}

impl RoleResolver {
    pub fn new(source: Arc<dyn RoleDefinitionSource>, context: ResolverContext) -> Self {
        Self { source, context }
    }

    pub fn context(&self) -> &ResolverContext {
        &self.context
    }

    /// Awaits `token`, drains every catalog page and returns the lookup
    ///
    /// Identifiers under one name keep catalog order. The token is checked
    /// before each page request and once more after the last page.
    pub async fn resolve_role_catalog<F>(&self, token: F) -> Result<RoleLookup>
    where
        F: IntoFuture<Output = stackbridge_deferred::Result<BearerToken>>,
    {
        let token = token.await?;
        let client = AuthenticatedClient::new(
            Arc::clone(&self.source),
            token,
            Arc::clone(&self.context.clock),
        );

        let mut lookup = RoleLookup::new();
        let mut page_count = 0usize;
        let mut pages = pin!(client.pages(&self.context.scope));

        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            debug!(
                page = page_count,
                entries = page.items.len(),
                terminal = page.is_terminal(),
                "Fetched role definition page"
            );
            for definition in page.items {
                lookup.insert(definition);
            }
        }

        client.ensure_valid()?;

        info!(
            scope = %self.context.scope,
            pages = page_count,
            roles = lookup.len(),
            names = lookup.name_count(),
            "Role definition catalog drained"
        );

        Ok(lookup)
    }

    /// Deferred form: raw token string in, role lookup out
    ///
    /// The token is wrapped with the context's validity window starting at
    /// the moment it resolves. The drain runs on the token's engine and the
    /// lookup is handed back as a deferred value.
    pub fn role_definitions(&self, token: &DeferredValue<String>) -> DeferredValue<RoleLookup> {
        let validity = self.context.token_validity;
        let clock = Arc::clone(&self.context.clock);
        let bearer = token.resolve_with(move |secret| BearerToken::with_validity(secret, validity, clock.now()));

        let resolver = self.clone();
        token
            .engine()
            .create(async move { resolver.resolve_role_catalog(bearer).await })
    }
}
