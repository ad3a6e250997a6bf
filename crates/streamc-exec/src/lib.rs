#![forbid(unsafe_code)]
//! streamc-exec: a deterministic in-memory runner for compiled topologies.
//!
//! The runner walks stages in id order (inputs always come first), keeps one
//! record list per stage and emits a `RunManifest`. It exists to check the
//! semantics of a topology, not to be a production runtime.

pub mod input;
pub mod metrics;
pub mod replay;
pub mod runtime;

pub use input::SourceData;
pub use runtime::{ExecError, LocalRunner, Record, RunOutput};
