#![forbid(unsafe_code)]
//! streamc-planner: ways to *build* a `PlanNode` tree for the compiler.
//!
//! Design:
//! - We reuse `streamc-core::dag` node types; nothing is forked here.
//! - This crate adds:
//!     * `PlanBuilder`, a fluent constructor that allocates `NodeId`s
//!     * a YAML DSL → `PlanNode` loader for the CLI and tests
//!
//! NOTE: there is no SQL front end and no optimizer. Trees are translated
//! exactly as written.

pub mod dsl;
pub mod error;
pub mod logical;

pub use dsl::yaml::{parse_yaml_plan, ParsedPlan, PlanConfig};
pub use error::{DslError, Result};
pub use logical::{PlanBuilder, PlanNode};
