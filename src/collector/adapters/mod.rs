//! Adapter implementations for the collector ports.

pub mod fs;
pub mod memory;

pub use fs::DirModelLoader;
