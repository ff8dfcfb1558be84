//! Role lookups for the stack's declarations
//!
//! Each declaration that needs a role identifier derives its own deferred
//! value from the catalog node, the same way a resource argument would. The
//! results are then awaited through the bridge.

use anyhow::{Context, Result};
use stackbridge_deferred::DeferredValue;
use stackbridge_roles::{DuplicatePolicy, RoleDefinitionId, RoleLookup, RoleResolver};
use std::time::Duration;
use tracing::{info, warn};

/// A role name resolved to the identifier a declaration will use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    pub name: String,
    pub id: RoleDefinitionId,
}

/// Deferred catalog for the stack, optionally held back by `settle_delay`
pub fn role_catalog(
    resolver: &RoleResolver,
    token: &DeferredValue<String>,
    settle_delay: Duration,
) -> DeferredValue<RoleLookup> {
    let catalog = resolver.role_definitions(token);
    if settle_delay.is_zero() {
        catalog
    } else {
        catalog.delay(settle_delay)
    }
}

/// Derives one deferred identifier per role name
pub fn role_ids(
    catalog: &DeferredValue<RoleLookup>,
    names: &[String],
    policy: DuplicatePolicy,
) -> Vec<(String, DeferredValue<RoleDefinitionId>)> {
    names
        .iter()
        .map(|name| {
            let lookup_name = name.clone();
            let id = catalog.try_apply(move |lookup| lookup.select(&lookup_name, policy).cloned());
            (name.clone(), id)
        })
        .collect()
}

/// Resolves every name, failing on the first one that cannot be bound
pub async fn bind_roles(
    catalog: &DeferredValue<RoleLookup>,
    names: &[String],
    policy: DuplicatePolicy,
) -> Result<Vec<RoleBinding>> {
    let pending = role_ids(catalog, names, policy);

    let mut bindings = Vec::with_capacity(pending.len());
    for (name, id) in pending {
        let id = id
            .await
            .with_context(|| format!("Failed to resolve role definition '{}'", name))?;
        info!(role = %name, id = %id, "Role definition resolved");
        bindings.push(RoleBinding { name, id });
    }

    let lookup = catalog.await.context("Role catalog unavailable")?;
    for (name, ids) in lookup.duplicates() {
        if names.iter().any(|wanted| wanted == name) {
            warn!(role = %name, count = ids.len(), "Role name has several definitions, using the first");
        }
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackbridge_deferred::Engine;
    use stackbridge_roles::{InMemoryRoleSource, ResolverContext, RoleDefinition};
    use std::sync::Arc;

    fn resolver(pages: Vec<Vec<RoleDefinition>>) -> RoleResolver {
        RoleResolver::new(Arc::new(InMemoryRoleSource::new(pages)), ResolverContext::default())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_bind_key_vault_roles() {
        let engine = Engine::current().unwrap();
        let resolver = resolver(vec![
            vec![
                RoleDefinition::new("Key Vault Secrets Officer", "/roles/officer"),
                RoleDefinition::new("Key Vault Secrets User", "/roles/user"),
            ],
            vec![RoleDefinition::new("Key Vault Reader", "/roles/reader")],
        ]);

        let catalog = role_catalog(&resolver, &engine.ready("token".to_string()), Duration::ZERO);
        let bindings = bind_roles(
            &catalog,
            &names(&["Key Vault Secrets Officer", "Key Vault Secrets User", "Key Vault Reader"]),
            DuplicatePolicy::First,
        )
        .await
        .unwrap();

        let ids: Vec<_> = bindings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["/roles/officer", "/roles/user", "/roles/reader"]);
    }

    #[tokio::test]
    async fn test_missing_role_fails_binding() {
        let engine = Engine::current().unwrap();
        let resolver = resolver(vec![vec![RoleDefinition::new("Owner", "O1")]]);

        let catalog = role_catalog(&resolver, &engine.ready("token".to_string()), Duration::ZERO);
        let err = bind_roles(&catalog, &names(&["Key Vault Reader"]), DuplicatePolicy::First)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Key Vault Reader"));
    }

    #[tokio::test]
    async fn test_reject_policy_fails_on_duplicates() {
        let engine = Engine::current().unwrap();
        let resolver = resolver(vec![
            vec![RoleDefinition::new("Reader", "R1")],
            vec![RoleDefinition::new("Reader", "R2")],
        ]);

        let catalog = role_catalog(&resolver, &engine.ready("token".to_string()), Duration::ZERO);

        let first = bind_roles(&catalog, &names(&["Reader"]), DuplicatePolicy::First)
            .await
            .unwrap();
        assert_eq!(first[0].id.as_str(), "R1");

        assert!(bind_roles(&catalog, &names(&["Reader"]), DuplicatePolicy::Reject)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_settle_delay_holds_catalog_back() {
        let engine = Engine::current().unwrap();
        let resolver = resolver(vec![vec![RoleDefinition::new("Owner", "O1")]]);

        let started = std::time::Instant::now();
        let catalog = role_catalog(
            &resolver,
            &engine.ready("token".to_string()),
            Duration::from_millis(50),
        );
        let lookup = catalog.await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(lookup.first("Owner").unwrap().as_str(), "O1");
    }
}
