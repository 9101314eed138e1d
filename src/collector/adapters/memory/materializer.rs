//! In-memory materializer for tests and embedded use.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::collector::{
    domain::{AdapterName, ConnectionName, ModelDefinition, ModelIdentity, RegistrySnapshot},
    ports::{
        AdapterRuntime, LiveConnection, Materialization, Materializer, MaterializerError,
        MaterializerResult,
    },
};

/// Handle produced for each materialized model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryCollection {
    connection: ConnectionName,
    adapter: AdapterName,
    definition: ModelDefinition,
}

impl InMemoryCollection {
    /// Returns the model identity.
    #[must_use]
    pub const fn identity(&self) -> &ModelIdentity {
        self.definition.identity()
    }

    /// Returns the connection the collection was opened through.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionName {
        &self.connection
    }

    /// Returns the adapter backing the collection.
    #[must_use]
    pub const fn adapter(&self) -> &AdapterName {
        &self.adapter
    }

    /// Returns the model definition with defaults applied.
    #[must_use]
    pub const fn definition(&self) -> &ModelDefinition {
        &self.definition
    }
}

/// Adapter runtime that counts teardowns.
#[derive(Debug)]
pub struct InMemoryAdapterRuntime {
    name: AdapterName,
    fail_teardown: bool,
    teardowns: AtomicUsize,
}

impl InMemoryAdapterRuntime {
    fn new(name: AdapterName, fail_teardown: bool) -> Self {
        Self {
            name,
            fail_teardown,
            teardowns: AtomicUsize::new(0),
        }
    }

    /// Returns how many times the runtime was torn down.
    #[must_use]
    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdapterRuntime for InMemoryAdapterRuntime {
    async fn teardown(&self) -> MaterializerResult<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(MaterializerError::teardown(
                self.name.clone(),
                std::io::Error::other(format!("adapter {} refused to tear down", self.name)),
            ));
        }
        Ok(())
    }
}

/// Materializer that opens one in-memory runtime per adapter.
///
/// Connections naming the same adapter share its runtime. Model references
/// are checked here: every model needs a connection (possibly from the
/// defaults) and every connection an adapter present in the snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMaterializer {
    failing_connects: BTreeSet<AdapterName>,
    failing_teardowns: BTreeSet<AdapterName>,
    runtimes: Arc<Mutex<BTreeMap<AdapterName, Arc<InMemoryAdapterRuntime>>>>,
}

impl InMemoryMaterializer {
    /// Creates a materializer whose adapters always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connection through `adapter` fail to open.
    #[must_use]
    pub fn with_failing_adapter(mut self, adapter: AdapterName) -> Self {
        self.failing_connects.insert(adapter);
        self
    }

    /// Makes the runtime for `adapter` fail on teardown.
    #[must_use]
    pub fn with_failing_teardown(mut self, adapter: AdapterName) -> Self {
        self.failing_teardowns.insert(adapter);
        self
    }

    /// Returns how often the runtime of `adapter` was torn down.
    ///
    /// Zero when the adapter was never materialized.
    #[must_use]
    pub fn teardown_count(&self, adapter: &AdapterName) -> usize {
        self.runtimes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(adapter)
            .map_or(0, |runtime| runtime.teardown_count())
    }

    fn open_connections(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> MaterializerResult<(
        BTreeMap<ConnectionName, LiveConnection>,
        BTreeMap<AdapterName, Arc<InMemoryAdapterRuntime>>,
    )> {
        let mut runtimes: BTreeMap<AdapterName, Arc<InMemoryAdapterRuntime>> = BTreeMap::new();
        let mut connections = BTreeMap::new();
        for (name, descriptor) in snapshot.connections() {
            let adapter = descriptor.adapter();
            if !snapshot.adapters().contains_key(adapter) {
                return Err(MaterializerError::UnknownAdapter {
                    connection: name.clone(),
                    adapter: adapter.clone(),
                });
            }
            if self.failing_connects.contains(adapter) {
                return Err(MaterializerError::connect(
                    name.clone(),
                    std::io::Error::other(format!("adapter {adapter} refused connection {name}")),
                ));
            }
            let runtime = runtimes.entry(adapter.clone()).or_insert_with(|| {
                Arc::new(InMemoryAdapterRuntime::new(
                    adapter.clone(),
                    self.failing_teardowns.contains(adapter),
                ))
            });
            let shared: Arc<dyn AdapterRuntime> = runtime.clone();
            connections.insert(name.clone(), LiveConnection::new(adapter.clone(), shared));
        }
        Ok((connections, runtimes))
    }
}

#[async_trait]
impl Materializer for InMemoryMaterializer {
    type Handle = InMemoryCollection;

    async fn materialize(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> MaterializerResult<Materialization<Self::Handle>> {
        let (connections, runtimes) = self.open_connections(snapshot)?;

        let mut models = BTreeMap::new();
        for model in snapshot.models().values() {
            let definition = model.with_defaults(snapshot.defaults());
            let connection = definition
                .connection()
                .cloned()
                .ok_or_else(|| MaterializerError::MissingConnection(model.identity().clone()))?;
            let live = connections
                .get(&connection)
                .ok_or_else(|| MaterializerError::UnknownConnection {
                    model: model.identity().clone(),
                    connection: connection.clone(),
                })?;
            let adapter = live.adapter().clone();
            models.insert(
                model.identity().clone(),
                InMemoryCollection {
                    connection,
                    adapter,
                    definition,
                },
            );
        }

        *self
            .runtimes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = runtimes;
        Ok(Materialization {
            models,
            connections,
        })
    }
}
