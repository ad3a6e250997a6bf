#![forbid(unsafe_code)]
//! streamc-compiler: turns a logical `PlanNode` tree into dataflow stages.
//!
//! - `codec::resolve_codec` picks the wire format for any subtree.
//! - `handle::PhysicalHandle` is the per-node result (stream or table).
//! - `builder::PhysicalPlanBuilder` walks the tree children-first and drives
//!   a `DataflowBuilder`/`SerdeRegistry` pair.
//! - `compile_plan` wires the in-tree `TopologyBuilder` and
//!   `DefaultSerdeRegistry` for callers that just want a `Topology`.

pub mod builder;
pub mod codec;
pub mod error;
pub mod handle;

pub use builder::{compile_plan, CompiledPlan, PhysicalPlanBuilder};
pub use codec::resolve_codec;
pub use error::{CompileError, Result};
pub use handle::{HandleKind, PhysicalHandle};
