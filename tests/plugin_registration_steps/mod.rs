//! Step definitions for plugin registration BDD scenarios.

pub mod world;
mod then;
