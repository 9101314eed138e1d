//! Scoped view tests across a nested plugin tree.

use super::helpers::{
    TestCollector, adapter, collector, connection, identities, identity, model, storage,
};
use rstest::rstest;
use waterworks::collector::{domain::ScopeId, services::CollectorServiceError};

/// Scopes of the tree used by every view test:
///
/// ```text
/// app (A, B)
/// ├── auth (C)
/// │   └── audit (E)
/// └── billing (D)
/// ```
struct Plugins {
    root: ScopeId,
    auth: ScopeId,
    audit: ScopeId,
    billing: ScopeId,
}

fn install_plugins(collector: &TestCollector) -> Plugins {
    let root = collector.root_scope();
    collector
        .contribute(
            root,
            storage("disk", "c1").with_models([model("A", "c1"), model("B", "c1")]),
        )
        .expect("root contribution should succeed");
    let auth = collector
        .create_child_scope(root, "auth")
        .expect("root exists");
    let billing = collector
        .create_child_scope(root, "billing")
        .expect("root exists");
    let audit = collector
        .create_child_scope(auth, "audit")
        .expect("auth exists");
    collector
        .contribute(billing, model("D", "c1"))
        .expect("billing contribution should succeed");
    collector
        .contribute(audit, model("E", "c1"))
        .expect("audit contribution should succeed");
    collector
        .contribute(auth, model("C", "c1"))
        .expect("auth contribution should succeed");
    Plugins {
        root,
        auth,
        audit,
        billing,
    }
}

fn view_names(collector: &TestCollector, scope: ScopeId, all: bool) -> Vec<String> {
    collector
        .resolve_view(scope, all)
        .expect("scope exists")
        .keys()
        .map(|name| name.as_str().to_owned())
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_scope_sees_every_model_when_unrestricted(collector: TestCollector) {
    let plugins = install_plugins(&collector);
    collector
        .materialize()
        .await
        .expect("materialization should succeed");

    for scope in [plugins.root, plugins.auth, plugins.audit, plugins.billing] {
        assert_eq!(view_names(&collector, scope, true), ["A", "B", "C", "D", "E"]);
    }
}

#[rstest]
#[case::root("root", &["A", "B", "C", "D", "E"])]
#[case::auth("auth", &["C", "E"])]
#[case::audit("audit", &["E"])]
#[case::billing("billing", &["D"])]
#[tokio::test(flavor = "multi_thread")]
async fn restricted_view_covers_the_subtree(
    collector: TestCollector,
    #[case] plugin: &str,
    #[case] expected: &[&str],
) {
    let plugins = install_plugins(&collector);
    collector
        .materialize()
        .await
        .expect("materialization should succeed");
    let scope = match plugin {
        "auth" => plugins.auth,
        "audit" => plugins.audit,
        "billing" => plugins.billing,
        _ => plugins.root,
    };

    assert_eq!(view_names(&collector, scope, false), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ownership_follows_contributing_scope(collector: TestCollector) {
    let plugins = install_plugins(&collector);

    assert_eq!(collector.owner_of(&identity("E")), Some(plugins.audit));
    assert_eq!(
        collector.owned_models(plugins.root, true).expect("root exists"),
        identities(&["A", "B", "C", "E", "D"])
    );
    assert_eq!(
        collector.owned_models(plugins.auth, false).expect("auth exists"),
        identities(&["C"])
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handles_point_at_their_connection(collector: TestCollector) {
    let plugins = install_plugins(&collector);
    let billing_storage = collector
        .create_child_scope(plugins.billing, "billing-storage")
        .expect("billing exists");
    collector
        .contribute(
            billing_storage,
            storage("ledger", "c2").with_model(model("invoice", "c2")),
        )
        .expect("nested contribution should succeed");
    collector
        .materialize()
        .await
        .expect("materialization should succeed");

    let view = collector
        .resolve_view(plugins.billing, false)
        .expect("billing exists");
    let invoice = view.get(&identity("invoice")).expect("invoice is visible");

    assert_eq!(view_names(&collector, plugins.billing, false), ["D", "invoice"]);
    assert_eq!(invoice.connection(), &connection("c2"));
    assert_eq!(invoice.adapter(), &adapter("ledger"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn views_are_empty_until_materialized(collector: TestCollector) {
    let plugins = install_plugins(&collector);

    for scope in [plugins.root, plugins.auth] {
        assert!(view_names(&collector, scope, true).is_empty());
        assert!(view_names(&collector, scope, false).is_empty());
    }
    assert!(matches!(
        collector.teardown().await,
        Err(CollectorServiceError::NotMaterialized)
    ));
}
