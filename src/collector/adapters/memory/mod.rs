//! In-memory adapters for the collector ports.

mod loader;
mod materializer;

pub use loader::{InMemoryModelLoader, StaticAdapterResolver};
pub use materializer::{InMemoryAdapterRuntime, InMemoryCollection, InMemoryMaterializer};
