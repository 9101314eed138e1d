//! Shared world state for plugin registration BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use waterworks::collector::{
    adapters::memory::InMemoryMaterializer,
    domain::{
        AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, ContributionSummary,
        ModelDefinition, ModelIdentity, ScopeId, StructuredFragment,
    },
    services::{CollectorService, CollectorServiceError, TeardownReport},
};

/// Service type used by the BDD world.
pub type TestCollector = CollectorService<InMemoryMaterializer, DefaultClock>;

/// Label given to the root plugin scope.
pub const ROOT_PLUGIN: &str = "app";

/// Scenario world for plugin registration behaviour tests.
pub struct PluginWorld {
    /// Materializer shared with the collector, kept for teardown counts.
    pub materializer: Arc<InMemoryMaterializer>,
    /// The collector under test.
    pub collector: TestCollector,
    /// Scopes by plugin label.
    pub scopes: HashMap<String, ScopeId>,
    /// Result of the last contribution made in a `when` step.
    pub last_contribution: Option<Result<ContributionSummary, CollectorServiceError>>,
    /// Result of the last host stop.
    pub last_stop: Option<Option<TeardownReport>>,
}

impl PluginWorld {
    /// Creates a world with only the root plugin scope.
    #[must_use]
    pub fn new() -> Self {
        let materializer = Arc::new(InMemoryMaterializer::new());
        let collector =
            CollectorService::new(ROOT_PLUGIN, Arc::clone(&materializer), Arc::new(DefaultClock));
        let scopes = HashMap::from([(ROOT_PLUGIN.to_owned(), collector.root_scope())]);
        Self {
            materializer,
            collector,
            scopes,
            last_contribution: None,
            last_stop: None,
        }
    }

    /// Returns the scope registered for `plugin`.
    ///
    /// # Errors
    ///
    /// Returns an error when no plugin with that label exists.
    pub fn scope(&self, plugin: &str) -> Result<ScopeId, eyre::Report> {
        self.scopes
            .get(plugin)
            .copied()
            .ok_or_else(|| eyre::eyre!("no plugin named '{plugin}' in scenario world"))
    }

    /// Creates a child plugin scope under the root.
    ///
    /// # Errors
    ///
    /// Returns an error when the scope cannot be created.
    pub fn add_child_plugin(&mut self, plugin: &str) -> Result<ScopeId, eyre::Report> {
        let root = self.scope(ROOT_PLUGIN)?;
        let child = self
            .collector
            .create_child_scope(root, plugin)
            .map_err(|err| eyre::eyre!("create child scope failed: {err}"))?;
        self.scopes.insert(plugin.to_owned(), child);
        Ok(child)
    }
}

impl Default for PluginWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PluginWorld {
    PluginWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a comma-separated list of model identities.
///
/// # Errors
///
/// Returns an error when an entry is blank.
pub fn parse_identities(list: &str) -> Result<Vec<ModelIdentity>, eyre::Report> {
    list.split(',')
        .map(|name| ModelIdentity::new(name).map_err(|err| eyre::eyre!("{err}")))
        .collect()
}

/// Builds model definitions stored through `connection`.
///
/// # Errors
///
/// Returns an error when a name is blank.
pub fn models_through(list: &str, connection: &str) -> Result<Vec<ModelDefinition>, eyre::Report> {
    let connection_name =
        ConnectionName::new(connection).map_err(|err| eyre::eyre!("{err}"))?;
    Ok(parse_identities(list)?
        .into_iter()
        .map(|identity| ModelDefinition::new(identity).with_connection(connection_name.clone()))
        .collect())
}

/// Builds a fragment declaring `adapter` and `connection` bound to it.
///
/// # Errors
///
/// Returns an error when a name is blank.
pub fn storage_fragment(adapter: &str, connection: &str) -> Result<StructuredFragment, eyre::Report> {
    let adapter_name = AdapterName::new(adapter).map_err(|err| eyre::eyre!("{err}"))?;
    let connection_name = ConnectionName::new(connection).map_err(|err| eyre::eyre!("{err}"))?;
    Ok(StructuredFragment::new()
        .with_adapter(adapter_name.clone(), AdapterDefinition::new())
        .with_connection(connection_name, ConnectionDescriptor::new(adapter_name)))
}
