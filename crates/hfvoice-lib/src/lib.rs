//! hfvoice-lib — Voice gateway engine.
//!
//! Env-file configuration, the inference provider client, and the HTTP API.
//! Depends on hfvoice-core for pure types and settings resolution.

pub mod config;
pub mod error;
pub mod inference;
pub mod server;

// Re-export hfvoice-core for convenience
pub use hfvoice_core;
