//! Shared registry of adapters, connections and models.

use super::{
    AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, ContributionError,
    Fragment, ModelDefaults, ModelDefinition, ModelIdentity, RegistrySnapshot, ScopeId, ScopeTree,
};
use std::collections::{BTreeMap, HashSet};

/// What a successful contribution added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContributionSummary {
    /// Number of adapters inserted.
    pub adapters: usize,
    /// Number of connections inserted.
    pub connections: usize,
    /// Number of models inserted and recorded against the scope.
    pub models: usize,
    /// Whether the contribution set the tree-wide defaults.
    pub defaults_set: bool,
    /// Whether the contribution set the teardown policy.
    pub teardown_policy_set: bool,
}

/// Registry collecting contributions from every scope of one tree.
///
/// Names are unique across all contributions. Defaults and the teardown
/// policy can each be set once. The registry does not know the tree; the
/// caller threads the [`ScopeTree`] into [`Registry::contribute`] so model
/// ownership is recorded alongside the insert.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    adapters: BTreeMap<AdapterName, AdapterDefinition>,
    connections: BTreeMap<ConnectionName, ConnectionDescriptor>,
    models: BTreeMap<ModelIdentity, ModelDefinition>,
    defaults: Option<ModelDefaults>,
    teardown_policy: Option<bool>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a fragment contributed through `scope`.
    ///
    /// Checks run in order: scope, adapters, connections, models, defaults,
    /// teardown policy. Nothing is applied until every check has passed, so
    /// a failing call leaves both the registry and the tree untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ContributionError::UnknownScope`] when `scope` is not in
    /// `scopes`, [`ContributionError::InvalidDefaults`] when the defaults
    /// name an unusable connection, and the matching `Duplicate*` variant on
    /// the first name collision or repeated tree-wide setting.
    pub fn contribute(
        &mut self,
        scopes: &mut ScopeTree,
        scope: ScopeId,
        fragment: Fragment,
    ) -> Result<ContributionSummary, ContributionError> {
        if !scopes.contains(scope) {
            return Err(ContributionError::UnknownScope(scope));
        }
        let structured = fragment.into_structured();
        self.validate(
            scopes,
            &structured.adapters,
            &structured.connections,
            &structured.models,
        )?;
        if let Some(defaults) = &structured.defaults {
            if self.defaults.is_some() {
                return Err(ContributionError::DuplicateDefaults);
            }
            defaults.connection()?;
        }
        if structured.teardown_policy.is_some() && self.teardown_policy.is_some() {
            return Err(ContributionError::DuplicateTeardownPolicy);
        }

        let summary = ContributionSummary {
            adapters: structured.adapters.len(),
            connections: structured.connections.len(),
            models: structured.models.len(),
            defaults_set: structured.defaults.is_some(),
            teardown_policy_set: structured.teardown_policy.is_some(),
        };

        let identities: Vec<ModelIdentity> = structured
            .models
            .iter()
            .map(|model| model.identity().clone())
            .collect();
        scopes.record_ownership(scope, identities)?;
        self.adapters.extend(structured.adapters);
        self.connections.extend(structured.connections);
        self.models.extend(
            structured
                .models
                .into_iter()
                .map(|model| (model.identity().clone(), model)),
        );
        if structured.defaults.is_some() {
            self.defaults = structured.defaults;
        }
        if structured.teardown_policy.is_some() {
            self.teardown_policy = structured.teardown_policy;
        }
        Ok(summary)
    }

    fn validate(
        &self,
        scopes: &ScopeTree,
        adapters: &BTreeMap<AdapterName, AdapterDefinition>,
        connections: &BTreeMap<ConnectionName, ConnectionDescriptor>,
        models: &[ModelDefinition],
    ) -> Result<(), ContributionError> {
        if let Some(name) = adapters.keys().find(|name| self.adapters.contains_key(*name)) {
            return Err(ContributionError::DuplicateAdapter(name.clone()));
        }
        if let Some(name) = connections
            .keys()
            .find(|name| self.connections.contains_key(*name))
        {
            return Err(ContributionError::DuplicateConnection(name.clone()));
        }

        let mut seen = HashSet::with_capacity(models.len());
        for identity in models.iter().map(ModelDefinition::identity) {
            let taken = self.models.contains_key(identity) || scopes.owner_of(identity).is_some();
            if taken || !seen.insert(identity) {
                return Err(ContributionError::DuplicateModel(identity.clone()));
            }
        }
        Ok(())
    }

    /// Returns an immutable copy of the registry for the materializer.
    ///
    /// Calling this repeatedly yields equal snapshots as long as nothing is
    /// contributed in between.
    #[must_use]
    pub fn finalize(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            adapters: self.adapters.clone(),
            connections: self.connections.clone(),
            models: self.models.clone(),
            defaults: self.defaults.clone().unwrap_or_default(),
            teardown_policy: self.teardown_policy,
        }
    }

    /// Returns `true` when a model with this identity was contributed.
    #[must_use]
    pub fn contains_model(&self, identity: &ModelIdentity) -> bool {
        self.models.contains_key(identity)
    }

    /// Returns the number of contributed models.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}
