//! mserver-harness - multi-server startup ordering smoke test
//!
//! Drives a database server through every combination of module-load and
//! service-start ordering while SQL and MAPI clients take turns against it.

pub mod cli;
pub mod commands;
pub mod common;
pub mod harness;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use harness::{Protocol, Readiness, RunSummary, Runner, Selection};
