#![forbid(unsafe_code)]
//! streamc-core: shared vocabulary for the streamc plan compiler.
//!
//! This crate owns the *logical* side of compilation: typed identifiers,
//! schemas, scalar values, expressions, codec descriptors and the plan node
//! tree (`dag`). It performs no I/O and knows nothing about dataflow stages.

pub mod codec;
pub mod config;
pub mod dag;
pub mod error;
pub mod expr;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod types;

/// Engine version string recorded in run manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
