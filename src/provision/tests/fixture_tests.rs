//! End-to-end role binding against the bundled catalog fixture

use stackbridge_deferred::Engine;
use stackbridge_provision::{bind_roles, role_catalog, ProvisionConfig};
use stackbridge_roles::{InMemoryRoleSource, RoleResolver};
use std::sync::Arc;
use std::time::Duration;

const FIXTURE: &str = include_str!("../../../fixtures/role-catalog.json");

#[tokio::test]
async fn test_default_stack_roles_resolve_from_fixture() {
    let config = ProvisionConfig::default();
    let engine = Engine::current().unwrap();

    let source = InMemoryRoleSource::from_json(FIXTURE).unwrap();
    let resolver = RoleResolver::new(Arc::new(source), config.resolver_context());

    let (token, completer) = engine.pending::<String>();
    let catalog = role_catalog(&resolver, &token, Duration::ZERO);
    completer.complete("offline".to_string()).unwrap();

    let bindings = bind_roles(&catalog, &config.stack.roles, config.stack.duplicate_policy)
        .await
        .unwrap();

    assert_eq!(bindings.len(), 3);
    assert_eq!(bindings[0].name, "Key Vault Secrets Officer");
    assert!(bindings[0].id.as_str().ends_with("b86a8fe4-44ce-4948-aee5-eccb2c155cd7"));
    assert!(bindings[2].id.as_str().ends_with("21090545-7ca7-4776-b22c-e363652d74d2"));
}

#[tokio::test]
async fn test_fixture_catalog_totals() {
    let engine = Engine::current().unwrap();
    let source = Arc::new(InMemoryRoleSource::from_json(FIXTURE).unwrap());
    let resolver = RoleResolver::new(source.clone(), ProvisionConfig::default().resolver_context());

    let lookup = role_catalog(&resolver, &engine.ready("offline".to_string()), Duration::ZERO)
        .await
        .unwrap();

    assert_eq!(lookup.len(), 4);
    assert_eq!(source.request_count(), 3);
}
