//! Waterworks: hierarchical registration aggregator for storage plugins.
//!
//! Plugins initialized as a tree contribute adapters, connections, model
//! definitions and model defaults to one shared registry. After every
//! plugin has contributed, the registry is handed once to a materializer
//! that opens connections and yields one live handle per model. Each
//! plugin can then ask for all handles or only those contributed by itself
//! and its descendants.
//!
//! # Architecture
//!
//! Waterworks follows hexagonal architecture principles:
//!
//! - **Domain**: Registry, scope tree and view resolution with no I/O
//! - **Ports**: Loader and materializer traits for external collaborators
//! - **Adapters**: In-memory and filesystem implementations of the ports
//! - **Services**: [`collector::services::CollectorService`] orchestration
//!
//! # Modules
//!
//! - [`collector`]: Contribution, scoping, materialization and teardown

pub mod collector;
