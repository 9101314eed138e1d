//! Materializer port turning a finalized registry into live handles.

use crate::collector::domain::{AdapterName, ConnectionName, ModelIdentity, RegistrySnapshot};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for materializer operations.
pub type MaterializerResult<T> = Result<T, MaterializerError>;

/// Produces live model and connection handles from a registry snapshot.
///
/// Called once, after every scope has finished contributing.
#[async_trait]
pub trait Materializer: Send + Sync {
    /// Handle type exposed for each materialized model.
    type Handle: Clone + Send + Sync + 'static;

    /// Connects every adapter and builds a handle per model.
    async fn materialize(
        &self,
        snapshot: &RegistrySnapshot,
    ) -> MaterializerResult<Materialization<Self::Handle>>;
}

/// Live resources held by one adapter.
///
/// Several connections may share one runtime; teardown is run once per
/// runtime, not once per connection.
#[async_trait]
pub trait AdapterRuntime: Send + Sync {
    /// Releases every resource held by the adapter.
    async fn teardown(&self) -> MaterializerResult<()>;
}

/// A connection that has been opened through an adapter runtime.
#[derive(Clone)]
pub struct LiveConnection {
    adapter: AdapterName,
    runtime: Arc<dyn AdapterRuntime>,
}

impl LiveConnection {
    /// Wraps an opened connection.
    #[must_use]
    pub fn new(adapter: AdapterName, runtime: Arc<dyn AdapterRuntime>) -> Self {
        Self { adapter, runtime }
    }

    /// Returns the name of the adapter backing the connection.
    #[must_use]
    pub const fn adapter(&self) -> &AdapterName {
        &self.adapter
    }

    /// Returns the adapter runtime.
    #[must_use]
    pub fn runtime(&self) -> &Arc<dyn AdapterRuntime> {
        &self.runtime
    }
}

impl fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConnection")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

/// Output of a successful materialization.
#[derive(Debug, Clone)]
pub struct Materialization<H> {
    /// Model handles keyed by identity.
    pub models: BTreeMap<ModelIdentity, H>,
    /// Opened connections keyed by name.
    pub connections: BTreeMap<ConnectionName, LiveConnection>,
}

/// Errors returned by materializer adapters.
#[derive(Debug, Clone, Error)]
pub enum MaterializerError {
    /// A model declares no connection and the defaults provide none.
    #[error("model {0} has no connection")]
    MissingConnection(ModelIdentity),

    /// A model references a connection that was never contributed.
    #[error("model {model} references unknown connection {connection}")]
    UnknownConnection {
        /// Referencing model.
        model: ModelIdentity,
        /// Missing connection.
        connection: ConnectionName,
    },

    /// A connection references an adapter that was never contributed.
    #[error("connection {connection} references unknown adapter {adapter}")]
    UnknownAdapter {
        /// Referencing connection.
        connection: ConnectionName,
        /// Missing adapter.
        adapter: AdapterName,
    },

    /// An adapter failed to open a connection.
    #[error("connection {connection} failed to open: {source}")]
    Connect {
        /// Connection being opened.
        connection: ConnectionName,
        /// Adapter failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// An adapter failed to release its resources.
    #[error("adapter {adapter} failed to tear down: {source}")]
    Teardown {
        /// Adapter being torn down.
        adapter: AdapterName,
        /// Adapter failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl MaterializerError {
    /// Wraps an adapter failure raised while opening `connection`.
    pub fn connect(
        connection: ConnectionName,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connect {
            connection,
            source: Arc::new(err),
        }
    }

    /// Wraps an adapter failure raised while tearing down `adapter`.
    pub fn teardown(
        adapter: AdapterName,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Teardown {
            adapter,
            source: Arc::new(err),
        }
    }
}
