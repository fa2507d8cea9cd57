//! Configuration objects for ingestion pipelines.
//!
//! Re-exports the shared configuration types required for pipeline setup and
//! operation.

// Re-exports.
pub use ingest_config::shared::*;
