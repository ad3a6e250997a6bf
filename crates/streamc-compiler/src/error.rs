use streamc_core::dag::JoinType;
use streamc_core::id::NodeId;
use streamc_dataflow::DataflowError;
use thiserror::Error;

use crate::handle::HandleKind;

/// Result type local to streamc-compiler.
pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unsupported plan node {kind} {id}")]
    UnsupportedNode { id: NodeId, kind: &'static str },

    #[error("join {id}: right input must be a table (left is {left}, right is {right})")]
    UnsupportedJoin {
        id: NodeId,
        left: HandleKind,
        right: HandleKind,
    },

    #[error("join {id}: {kind} joins are not supported")]
    UnsupportedJoinKind { id: NodeId, kind: JoinType },

    #[error("output {id}: {reason}")]
    UnsupportedOutput { id: NodeId, reason: String },

    #[error("plan root {kind} {id} is not an output node")]
    InvalidRoot { id: NodeId, kind: &'static str },

    #[error("node {id}: field '{field}' not found")]
    MissingField { id: NodeId, field: String },

    #[error("plan is nested deeper than {limit} at node {id}")]
    PlanTooDeep { id: NodeId, limit: usize },

    #[error(transparent)]
    Dataflow(#[from] DataflowError),
}
