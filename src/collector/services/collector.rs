//! Service layer coordinating contribution, materialization and views.
//!
//! Provides [`CollectorService`], which owns one registry and its scope tree
//! for a top-level initialization. Every contribution and lookup goes through
//! it; there is no process-wide registry.

use super::options::{FragmentResolveError, FragmentResolver, PluginOptions};
use super::teardown::{Teardown, TeardownReport};
use crate::collector::{
    domain::{
        AdapterName, ConnectionName, ContributionError, ContributionSummary, Fragment,
        ModelIdentity, Registry, RegistrySnapshot, ScopeError, ScopeId, ScopeTree, resolve_view,
    },
    ports::{AdapterResolver, LiveConnection, Materializer, MaterializerError, ModelLoader},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for collector operations.
#[derive(Debug, Error)]
pub enum CollectorServiceError {
    /// A contribution was rejected.
    #[error(transparent)]
    Contribution(#[from] ContributionError),
    /// A scope lookup failed.
    #[error(transparent)]
    Scope(#[from] ScopeError),
    /// Plugin options could not be resolved.
    #[error(transparent)]
    Resolve(#[from] FragmentResolveError),
    /// The materializer or an adapter runtime failed.
    #[error(transparent)]
    Materializer(#[from] MaterializerError),
    /// Materialization already ran or is running.
    #[error("registry has already been materialized")]
    AlreadyMaterialized,
    /// Contributions are closed once materialization starts.
    #[error("registry is frozen; contributions are closed once materialization starts")]
    RegistryFrozen,
    /// The operation needs a materialized registry.
    #[error("registry has not been materialized")]
    NotMaterialized,
}

/// Result type for collector service operations.
pub type CollectorServiceResult<T> = Result<T, CollectorServiceError>;

struct CollectorState {
    registry: Registry,
    scopes: ScopeTree,
}

struct Published<H> {
    models: BTreeMap<ModelIdentity, H>,
    connections: BTreeMap<ConnectionName, LiveConnection>,
    teardown: Teardown,
    teardown_on_stop: bool,
    materialized_at: DateTime<Utc>,
}

/// Reopens the registry when dropped before [`FreezeGuard::keep`].
///
/// Covers both a failed materializer and a `materialize` future dropped
/// mid-await.
struct FreezeGuard<'a> {
    frozen: &'a AtomicBool,
    kept: bool,
}

impl<'a> FreezeGuard<'a> {
    const fn new(frozen: &'a AtomicBool) -> Self {
        Self {
            frozen,
            kept: false,
        }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for FreezeGuard<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.frozen.store(false, Ordering::SeqCst);
        }
    }
}

/// Registration aggregator for one tree of plugin scopes.
pub struct CollectorService<M, C>
where
    M: Materializer,
    C: Clock + Send + Sync,
{
    materializer: Arc<M>,
    clock: Arc<C>,
    state: RwLock<CollectorState>,
    frozen: AtomicBool,
    published: OnceLock<Published<M::Handle>>,
}

impl<M, C> CollectorService<M, C>
where
    M: Materializer,
    C: Clock + Send + Sync,
{
    /// Creates a collector whose root scope carries `root_label`.
    #[must_use]
    pub fn new(root_label: impl Into<String>, materializer: Arc<M>, clock: Arc<C>) -> Self {
        Self {
            materializer,
            clock,
            state: RwLock::new(CollectorState {
                registry: Registry::new(),
                scopes: ScopeTree::new(root_label),
            }),
            frozen: AtomicBool::new(false),
            published: OnceLock::new(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CollectorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CollectorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the root scope of the tree.
    #[must_use]
    pub fn root_scope(&self) -> ScopeId {
        self.read_state().scopes.root()
    }

    /// Creates a scope for a plugin initialized under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::Scope`] when `parent` is unknown.
    pub fn create_child_scope(
        &self,
        parent: ScopeId,
        label: impl Into<String>,
    ) -> CollectorServiceResult<ScopeId> {
        let label_text = label.into();
        let child = self
            .write_state()
            .scopes
            .create_child_scope(parent, label_text.clone())?;
        debug!(%parent, scope = %child, label = %label_text, "scope created");
        Ok(child)
    }

    /// Merges `fragment` into the registry on behalf of `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::RegistryFrozen`] once materialization
    /// has started, or [`CollectorServiceError::Contribution`] when the
    /// fragment collides with earlier contributions. Rejected fragments leave
    /// the registry untouched.
    pub fn contribute(
        &self,
        scope: ScopeId,
        fragment: impl Into<Fragment>,
    ) -> CollectorServiceResult<ContributionSummary> {
        let mut state = self.write_state();
        if self.frozen.load(Ordering::SeqCst) {
            return Err(CollectorServiceError::RegistryFrozen);
        }
        let CollectorState { registry, scopes } = &mut *state;
        match registry.contribute(scopes, scope, fragment.into()) {
            Ok(summary) => {
                info!(
                    %scope,
                    adapters = summary.adapters,
                    connections = summary.connections,
                    models = summary.models,
                    defaults = summary.defaults_set,
                    teardown_policy = summary.teardown_policy_set,
                    "fragment contributed"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(%scope, error = %err, "fragment rejected");
                Err(err.into())
            }
        }
    }

    /// Resolves plugin options and contributes the result for `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::Resolve`] when a loader port fails,
    /// otherwise the errors of [`CollectorService::contribute`].
    pub fn register_plugin<L, A>(
        &self,
        scope: ScopeId,
        options: PluginOptions,
        resolver: &FragmentResolver<L, A>,
    ) -> CollectorServiceResult<ContributionSummary>
    where
        L: ModelLoader,
        A: AdapterResolver,
    {
        let fragment = resolver.resolve(options)?;
        self.contribute(scope, fragment)
    }

    /// Returns the models contributed through `scope`, optionally including
    /// its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::Scope`] when `scope` is unknown.
    pub fn owned_models(
        &self,
        scope: ScopeId,
        transitive: bool,
    ) -> CollectorServiceResult<Vec<ModelIdentity>> {
        Ok(self.read_state().scopes.owned_models(scope, transitive)?)
    }

    /// Returns the scope that contributed `identity`, if any.
    #[must_use]
    pub fn owner_of(&self, identity: &ModelIdentity) -> Option<ScopeId> {
        self.read_state().scopes.owner_of(identity)
    }

    /// Returns a snapshot of everything contributed so far.
    #[must_use]
    pub fn finalize(&self) -> RegistrySnapshot {
        self.read_state().registry.finalize()
    }

    /// Runs the materializer once and publishes its handles.
    ///
    /// Contributions are refused from the moment this starts. When the
    /// materializer fails, or the returned future is dropped before it
    /// completes, the registry is reopened so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::AlreadyMaterialized`] on a second
    /// call, or [`CollectorServiceError::Materializer`] when the materializer
    /// fails.
    pub async fn materialize(&self) -> CollectorServiceResult<()> {
        if self.frozen.swap(true, Ordering::SeqCst) {
            return Err(CollectorServiceError::AlreadyMaterialized);
        }
        let freeze = FreezeGuard::new(&self.frozen);
        let snapshot = self.finalize();

        let materialization = self
            .materializer
            .materialize(&snapshot)
            .await
            .inspect_err(|err| warn!(error = %err, "materialization failed"))?;

        let teardown = Teardown::from_connections(&materialization.connections);
        let published = Published {
            models: materialization.models,
            connections: materialization.connections,
            teardown,
            teardown_on_stop: snapshot.teardown_on_stop(),
            materialized_at: self.clock.utc(),
        };
        info!(
            models = published.models.len(),
            connections = published.connections.len(),
            adapters = published.teardown.runtime_count(),
            "registry materialized"
        );
        self.published
            .set(published)
            .map_err(|_| CollectorServiceError::AlreadyMaterialized)?;
        freeze.keep();
        Ok(())
    }

    /// Returns `true` once materialization has been published.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.published.get().is_some()
    }

    /// Returns when materialization was published.
    #[must_use]
    pub fn materialized_at(&self) -> Option<DateTime<Utc>> {
        self.published.get().map(|published| published.materialized_at)
    }

    /// Returns the model handles visible from `scope`.
    ///
    /// Empty before materialization. With `all` every handle is returned,
    /// otherwise only those owned by `scope` and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::Scope`] when a scoped lookup names an
    /// unknown scope.
    pub fn resolve_view(
        &self,
        scope: ScopeId,
        all: bool,
    ) -> CollectorServiceResult<BTreeMap<ModelIdentity, M::Handle>> {
        let materialized = self.published.get().map(|published| &published.models);
        Ok(resolve_view(&self.read_state().scopes, scope, all, materialized)?)
    }

    /// Returns each materialized connection with the adapter behind it.
    ///
    /// Empty before materialization.
    #[must_use]
    pub fn live_connections(&self) -> BTreeMap<ConnectionName, AdapterName> {
        self.published
            .get()
            .map(|published| {
                published
                    .connections
                    .iter()
                    .map(|(name, connection)| (name.clone(), connection.adapter().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Releases every adapter runtime exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::NotMaterialized`] before
    /// materialization, or [`CollectorServiceError::Materializer`] when an
    /// adapter fails to tear down.
    pub async fn teardown(&self) -> CollectorServiceResult<TeardownReport> {
        let published = self
            .published
            .get()
            .ok_or(CollectorServiceError::NotMaterialized)?;
        Ok(published.teardown.run().await?)
    }

    /// Host stop hook honouring the teardown policy.
    ///
    /// Returns `None` when nothing was materialized or the policy keeps
    /// connections open.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorServiceError::Materializer`] when an adapter fails
    /// to tear down.
    pub async fn stop(&self) -> CollectorServiceResult<Option<TeardownReport>> {
        let Some(published) = self.published.get() else {
            return Ok(None);
        };
        if !published.teardown_on_stop {
            debug!("teardown on stop disabled; leaving connections open");
            return Ok(None);
        }
        Ok(Some(published.teardown.run().await?))
    }
}
