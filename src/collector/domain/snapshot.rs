//! Finalized registry contents handed to the materializer.

use super::{
    AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, ModelDefaults,
    ModelDefinition, ModelIdentity,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Immutable copy of everything contributed to a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub(super) adapters: BTreeMap<AdapterName, AdapterDefinition>,
    pub(super) connections: BTreeMap<ConnectionName, ConnectionDescriptor>,
    pub(super) models: BTreeMap<ModelIdentity, ModelDefinition>,
    pub(super) defaults: ModelDefaults,
    pub(super) teardown_policy: Option<bool>,
}

impl RegistrySnapshot {
    /// Returns every contributed adapter.
    #[must_use]
    pub const fn adapters(&self) -> &BTreeMap<AdapterName, AdapterDefinition> {
        &self.adapters
    }

    /// Returns every contributed connection.
    #[must_use]
    pub const fn connections(&self) -> &BTreeMap<ConnectionName, ConnectionDescriptor> {
        &self.connections
    }

    /// Returns every contributed model definition, as contributed.
    #[must_use]
    pub const fn models(&self) -> &BTreeMap<ModelIdentity, ModelDefinition> {
        &self.models
    }

    /// Returns the tree-wide defaults; empty when none were contributed.
    #[must_use]
    pub const fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    /// Returns the teardown policy exactly as contributed.
    #[must_use]
    pub const fn teardown_policy(&self) -> Option<bool> {
        self.teardown_policy
    }

    /// Returns whether stopping the host should tear down connections.
    ///
    /// Defaults to `true` when no scope set a policy.
    #[must_use]
    pub fn teardown_on_stop(&self) -> bool {
        self.teardown_policy.unwrap_or(true)
    }

    /// Returns a model definition with the tree-wide defaults applied.
    #[must_use]
    pub fn effective_model(&self, identity: &ModelIdentity) -> Option<ModelDefinition> {
        self.models
            .get(identity)
            .map(|model| model.with_defaults(&self.defaults))
    }
}
