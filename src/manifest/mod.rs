//! Manifest document: wire schema, loading, and generation from a frame directory.

/// Directory → manifest producer.
pub mod generate;
/// Fetch + parse + validate.
pub mod loader;
/// Wire document and resolved manifest.
pub mod model;
