//! Contribution tests against the collector service.

use super::helpers::{TestCollector, collector, connection, identities, model, storage};
use rstest::rstest;
use serde_json::json;
use waterworks::collector::{
    domain::{ContributionError, Fragment, ModelDefaults, StructuredFragment},
    services::CollectorServiceError,
};

#[rstest]
fn nested_plugins_union_into_one_registry(collector: TestCollector) {
    let root = collector.root_scope();
    let auth = collector
        .create_child_scope(root, "auth")
        .expect("root exists");
    collector
        .contribute(root, storage("disk", "c1").with_model(model("user", "c1")))
        .expect("root contribution should succeed");
    collector
        .contribute(auth, storage("memory", "sessions").with_model(model("token", "sessions")))
        .expect("auth contribution should succeed");

    let snapshot = collector.finalize();

    assert_eq!(snapshot.adapters().len(), 2);
    assert_eq!(snapshot.connections().len(), 2);
    assert_eq!(
        snapshot.models().keys().cloned().collect::<Vec<_>>(),
        identities(&["token", "user"])
    );
    assert!(snapshot.teardown_on_stop());
}

#[rstest]
fn sibling_plugins_cannot_share_a_connection_name(collector: TestCollector) {
    let root = collector.root_scope();
    let first = collector
        .create_child_scope(root, "first")
        .expect("root exists");
    let second = collector
        .create_child_scope(root, "second")
        .expect("root exists");
    collector
        .contribute(first, storage("disk", "shared"))
        .expect("first contribution should succeed");

    let result = collector.contribute(second, storage("memory", "shared"));

    assert!(matches!(
        result,
        Err(CollectorServiceError::Contribution(
            ContributionError::DuplicateConnection(ref name)
        )) if name == &connection("shared")
    ));
}

#[rstest]
fn rejected_fragment_leaves_no_trace(collector: TestCollector) {
    let root = collector.root_scope();
    let child = collector
        .create_child_scope(root, "child")
        .expect("root exists");
    collector
        .contribute(root, model("taken", "c1"))
        .expect("first contribution should succeed");

    let result = collector.contribute(
        child,
        storage("disk", "c2").with_models([model("fresh", "c2"), model("taken", "c2")]),
    );

    assert!(matches!(
        result,
        Err(CollectorServiceError::Contribution(
            ContributionError::DuplicateModel(_)
        ))
    ));
    let snapshot = collector.finalize();
    assert!(snapshot.adapters().is_empty());
    assert!(!snapshot.connections().contains_key(&connection("c2")));
    assert_eq!(
        snapshot.models().keys().cloned().collect::<Vec<_>>(),
        identities(&["taken"])
    );
    assert!(
        collector
            .owned_models(child, false)
            .expect("child exists")
            .is_empty()
    );
}

#[rstest]
fn defaults_are_set_once_per_tree(collector: TestCollector) {
    let root = collector.root_scope();
    let child = collector
        .create_child_scope(root, "child")
        .expect("root exists");
    let defaults = ModelDefaults::new().with("migrate", json!("safe"));
    collector
        .contribute(root, storage("disk", "c1").with_defaults(defaults.clone()))
        .expect("first defaults should succeed");

    let result = collector.contribute(
        child,
        StructuredFragment::new().with_defaults(defaults),
    );

    assert!(matches!(
        result,
        Err(CollectorServiceError::Contribution(
            ContributionError::DuplicateDefaults
        ))
    ));
}

#[rstest]
#[case(json!({ "identity": "a", "connection": "c1" }), &["a"])]
#[case(json!([{ "identity": "a" }, { "identity": "b" }]), &["a", "b"])]
#[case(json!({ "models": { "identity": "a" } }), &["a"])]
#[case(json!({ "models": [{ "identity": "a" }, { "identity": "b" }] }), &["a", "b"])]
fn json_fragments_contribute_their_models(
    collector: TestCollector,
    #[case] raw: serde_json::Value,
    #[case] expected: &[&str],
) {
    let root = collector.root_scope();
    let fragment = Fragment::try_from(raw).expect("fragment shape is valid");

    let summary = collector
        .contribute(root, fragment)
        .expect("contribution should succeed");

    assert_eq!(summary.models, expected.len());
    assert_eq!(
        collector.owned_models(root, false).expect("root exists"),
        identities(expected)
    );
}

#[rstest]
#[case(json!("models.json"))]
#[case(json!(42))]
#[case(json!({ "identity": "a", "models": [] }))]
#[case(json!({ "adapters": {}, "plugins": [] }))]
fn malformed_json_fragments_are_rejected(#[case] raw: serde_json::Value) {
    let result = Fragment::try_from(raw);

    assert!(matches!(
        result,
        Err(ContributionError::InvalidFragmentShape(_))
    ));
}
