//! Teardown of every adapter runtime behind a materialization.

use crate::collector::{
    domain::{AdapterName, ConnectionName},
    ports::{AdapterRuntime, LiveConnection, MaterializerError, MaterializerResult},
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Adapters released by a teardown run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Adapters whose runtime was torn down, sorted by name.
    pub released: Vec<AdapterName>,
}

/// One-shot teardown over the distinct runtimes of a set of connections.
///
/// Connections sharing a runtime contribute it once. The first [`run`]
/// tears every runtime down concurrently and records the outcome; later
/// runs wait for it and never touch a runtime again.
///
/// [`run`]: Teardown::run
#[derive(Clone)]
pub struct Teardown {
    runtimes: Vec<(AdapterName, Arc<dyn AdapterRuntime>)>,
    outcome: Arc<OnceCell<MaterializerResult<TeardownReport>>>,
}

impl Teardown {
    /// Collects the distinct runtimes behind `connections`.
    #[must_use]
    pub fn from_connections(connections: &BTreeMap<ConnectionName, LiveConnection>) -> Self {
        let mut runtimes: Vec<(AdapterName, Arc<dyn AdapterRuntime>)> = Vec::new();
        for connection in connections.values() {
            let seen = runtimes
                .iter()
                .any(|(_, runtime)| Arc::ptr_eq(runtime, connection.runtime()));
            if !seen {
                runtimes.push((connection.adapter().clone(), Arc::clone(connection.runtime())));
            }
        }
        Self {
            runtimes,
            outcome: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the number of distinct runtimes to release.
    #[must_use]
    pub fn runtime_count(&self) -> usize {
        self.runtimes.len()
    }

    /// Returns `true` once a [`Teardown::run`] has finished.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.outcome.initialized()
    }

    /// Tears every runtime down exactly once.
    ///
    /// All runtimes are attempted even when one fails; the first failure is
    /// returned after the others have finished. After a successful run later
    /// calls return an empty report; after a failed run they return the same
    /// failure again.
    ///
    /// # Errors
    ///
    /// Returns the first [`MaterializerError`] raised by a runtime, on this
    /// call or on the run that first tore the runtimes down.
    pub async fn run(&self) -> MaterializerResult<TeardownReport> {
        let mut first = false;
        let outcome = self
            .outcome
            .get_or_init(|| {
                first = true;
                self.release_all()
            })
            .await;
        match outcome {
            Ok(report) if first => Ok(report.clone()),
            Ok(_) => Ok(TeardownReport::default()),
            Err(err) => Err(err.clone()),
        }
    }

    async fn release_all(&self) -> MaterializerResult<TeardownReport> {
        let mut tasks = JoinSet::new();
        for (adapter, runtime) in &self.runtimes {
            let name = adapter.clone();
            let target = Arc::clone(runtime);
            tasks.spawn(async move { (name, target.teardown().await) });
        }

        let mut released = Vec::with_capacity(self.runtimes.len());
        let mut first_failure: Option<MaterializerError> = None;
        while let Some(joined) = tasks.join_next().await {
            let (adapter, outcome) = match joined {
                Ok(finished) => finished,
                Err(err) => std::panic::resume_unwind(err.into_panic()),
            };
            match outcome {
                Ok(()) => released.push(adapter),
                Err(err) => {
                    warn!(adapter = %adapter, error = %err, "adapter teardown failed");
                    first_failure.get_or_insert(err);
                }
            }
        }

        released.sort();
        if let Some(err) = first_failure {
            warn!(released = ?released, "teardown incomplete");
            return Err(err);
        }
        info!(adapters = released.len(), "adapters torn down");
        Ok(TeardownReport { released })
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let adapters: Vec<&AdapterName> = self.runtimes.iter().map(|(name, _)| name).collect();
        f.debug_struct("Teardown")
            .field("adapters", &adapters)
            .field("finished", &self.has_run())
            .finish()
    }
}
