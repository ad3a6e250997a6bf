//! Convenient re-exports for downstream crates.

pub use crate::codec::CodecDescriptor;
pub use crate::config::CompilerConfig;
pub use crate::dag::{
    DataSourceType, FilterNode, JoinNode, JoinType, OutputNode, OutputTarget, PlanNode,
    ProjectNode, SourceNode,
};
pub use crate::error::{Error, Result};
pub use crate::expr::Expr;
pub use crate::id::{NodeId, StageId};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Row, Scalar};
