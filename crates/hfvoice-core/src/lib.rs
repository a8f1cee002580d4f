//! hfvoice-core — Pure types and configuration resolution.
//!
//! No async runtime, no network I/O.

pub mod settings;
pub mod types;
