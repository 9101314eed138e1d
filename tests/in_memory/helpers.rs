//! Shared test helpers for in-memory collector integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use waterworks::collector::{
    adapters::memory::InMemoryMaterializer,
    domain::{
        AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, ModelDefinition,
        ModelIdentity, StructuredFragment,
    },
    services::CollectorService,
};

/// Collector backed by the in-memory materializer.
pub type TestCollector = CollectorService<InMemoryMaterializer, DefaultClock>;

/// Provides a collector over a fresh in-memory materializer.
#[fixture]
pub fn collector() -> TestCollector {
    collector_with(InMemoryMaterializer::new()).1
}

/// Builds a collector over `materializer`, keeping a handle for inspection.
pub fn collector_with(
    materializer: InMemoryMaterializer,
) -> (Arc<InMemoryMaterializer>, TestCollector) {
    let shared = Arc::new(materializer);
    let collector = CollectorService::new("app", Arc::clone(&shared), Arc::new(DefaultClock));
    (shared, collector)
}

/// Builds a validated adapter name.
pub fn adapter(name: &str) -> AdapterName {
    AdapterName::new(name).expect("valid adapter name")
}

/// Builds a validated connection name.
pub fn connection(name: &str) -> ConnectionName {
    ConnectionName::new(name).expect("valid connection name")
}

/// Builds a validated model identity.
pub fn identity(name: &str) -> ModelIdentity {
    ModelIdentity::new(name).expect("valid model identity")
}

/// Builds identities in the given order.
pub fn identities(names: &[&str]) -> Vec<ModelIdentity> {
    names.iter().map(|name| identity(name)).collect()
}

/// Model stored through `connection_name`.
pub fn model(name: &str, connection_name: &str) -> ModelDefinition {
    ModelDefinition::new(identity(name)).with_connection(connection(connection_name))
}

/// Fragment declaring one adapter and one connection bound to it.
pub fn storage(adapter_name: &str, connection_name: &str) -> StructuredFragment {
    StructuredFragment::new()
        .with_adapter(adapter(adapter_name), AdapterDefinition::new())
        .with_connection(
            connection(connection_name),
            ConnectionDescriptor::new(adapter(adapter_name)),
        )
}
