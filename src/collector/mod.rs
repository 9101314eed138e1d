//! Hierarchical registration of ORM configuration for nested plugins.
//!
//! Plugins initialize as a tree of scopes. Each scope contributes adapters,
//! connections and model definitions into one shared registry that rejects
//! duplicates, and can later look up only the models it (and its
//! descendants) contributed. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
