//! Multi-server smoke harness
//!
//! Starts a server once per sub-scenario with one of four initialization
//! orderings, drives four SQL/MAPI clients against it in one of six fixed
//! interleavings, and shuts it down again. Outcomes of the child processes
//! are not judged here; the diagnostics written to stdout and stderr are
//! compared against a baseline by whatever wraps the harness.

pub mod diagnostics;
pub mod plan;
pub mod process;
pub mod readiness;
pub mod runner;

pub use diagnostics::{DiagnosticSink, StdStreams};
pub use plan::{describe, ClientInvocation, Protocol, Scenario, Selection, SubScenario};
pub use readiness::Readiness;
pub use runner::{RunSummary, Runner};
