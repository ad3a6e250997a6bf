//! Logical plan nodes consumed by the physical compiler.
//!
//! The upstream planner produces a `PlanNode` tree (what to do); the compiler
//! in `streamc-compiler` turns it into dataflow stages (how to run it).
//! Child cardinality is fixed by the variant types: filters, projections and
//! outputs own exactly one boxed child, joins own two.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::CodecDescriptor;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::id::NodeId;
use crate::schema::{DataType, Field, Schema};

/// Whether a source is read as an append-only stream or a changelog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    Stream,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    Left,
    Inner,
    Outer,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Left => "LEFT",
            JoinType::Inner => "INNER",
            JoinType::Outer => "OUTER",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    pub id: NodeId,
    /// Origin identifier (topic or table name).
    pub topic: String,
    pub schema: Schema,
    pub key_field: Field,
    pub source_type: DataSourceType,
    pub codec: CodecDescriptor,
}

impl SourceNode {
    /// Resolve `key_field` (case-insensitive) against `schema`.
    pub fn new(
        id: NodeId,
        topic: impl Into<String>,
        schema: Schema,
        key_field: &str,
        source_type: DataSourceType,
        codec: CodecDescriptor,
    ) -> Result<Self> {
        let topic = topic.into();
        let key_field = schema.field_by_name(key_field).cloned().ok_or_else(|| {
            Error::Schema(format!(
                "key field '{}' not found in source '{}' schema {}",
                key_field, topic, schema
            ))
        })?;
        Ok(Self {
            id,
            topic,
            schema,
            key_field,
            source_type,
            codec,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    pub id: NodeId,
    pub source: Box<PlanNode>,
    pub predicate: Expr,
}

impl FilterNode {
    /// The predicate must type as a boolean over the child's schema.
    pub fn new(id: NodeId, source: PlanNode, predicate: Expr) -> Result<Self> {
        let ty = predicate.data_type(source.schema())?;
        if ty != DataType::Boolean {
            return Err(Error::Plan(format!(
                "filter {} predicate {} is {}, not BOOLEAN",
                id, predicate, ty
            )));
        }
        Ok(Self {
            id,
            source: Box::new(source),
            predicate,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: NodeId,
    pub source: Box<PlanNode>,
    pub schema: Schema,
    pub expressions: Vec<Expr>,
}

impl ProjectNode {
    pub fn new(id: NodeId, source: PlanNode, schema: Schema, expressions: Vec<Expr>) -> Result<Self> {
        if schema.len() != expressions.len() {
            return Err(Error::Plan(format!(
                "project {} has {} expressions for {} output fields",
                id,
                expressions.len(),
                schema.len()
            )));
        }
        for expr in &expressions {
            expr.data_type(source.schema())?;
        }
        Ok(Self {
            id,
            source: Box::new(source),
            schema,
            expressions,
        })
    }

    /// Build the output schema from `(expression, alias)` pairs, inferring
    /// each field's type against the child schema.
    pub fn from_aliased(id: NodeId, source: PlanNode, items: Vec<(Expr, String)>) -> Result<Self> {
        let mut fields = Vec::with_capacity(items.len());
        let mut expressions = Vec::with_capacity(items.len());
        for (expr, alias) in items {
            let ty = expr.data_type(source.schema())?;
            fields.push(Field::new(alias, ty, true));
            expressions.push(expr);
        }
        Self::new(id, source, Schema::new(fields), expressions)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinNode {
    pub id: NodeId,
    pub join_type: JoinType,
    pub left: Box<PlanNode>,
    pub right: Box<PlanNode>,
    pub left_key_field_name: String,
    pub right_key_field_name: String,
    pub left_alias: String,
    pub right_alias: String,
    /// `<left_alias>.<f>` for each left field, then `<right_alias>.<f>` for each right field.
    pub schema: Schema,
}

impl JoinNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: NodeId,
        join_type: JoinType,
        left: PlanNode,
        right: PlanNode,
        left_key_field_name: impl Into<String>,
        right_key_field_name: impl Into<String>,
        left_alias: impl Into<String>,
        right_alias: impl Into<String>,
    ) -> Result<Self> {
        let left_key_field_name = left_key_field_name.into();
        let right_key_field_name = right_key_field_name.into();
        let left_alias = left_alias.into();
        let right_alias = right_alias.into();

        if left.schema().field_by_name(&left_key_field_name).is_none() {
            return Err(Error::Schema(format!(
                "join {} left key '{}' not in {}",
                id,
                left_key_field_name,
                left.schema()
            )));
        }
        if right.schema().field_by_name(&right_key_field_name).is_none() {
            return Err(Error::Schema(format!(
                "join {} right key '{}' not in {}",
                id,
                right_key_field_name,
                right.schema()
            )));
        }
        if left_alias.eq_ignore_ascii_case(&right_alias) {
            return Err(Error::Plan(format!(
                "join {} uses alias '{}' for both sides",
                id, left_alias
            )));
        }

        let schema = left
            .schema()
            .qualified(&left_alias)
            .concat(&right.schema().qualified(&right_alias));

        Ok(Self {
            id,
            join_type,
            left: Box::new(left),
            right: Box::new(right),
            left_key_field_name,
            right_key_field_name,
            left_alias,
            right_alias,
            schema,
        })
    }
}

/// Where the root of a plan delivers its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// Publish to a named destination topic.
    Topic { name: String },
    /// Render to a human-readable console trace.
    Console,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputNode {
    pub id: NodeId,
    pub source: Box<PlanNode>,
    pub target: OutputTarget,
}

impl OutputNode {
    pub fn new(id: NodeId, source: PlanNode, target: OutputTarget) -> Self {
        Self {
            id,
            source: Box::new(source),
            target,
        }
    }

    pub fn schema(&self) -> &Schema {
        self.source.schema()
    }

    /// Destination topic name, if this is a topic sink.
    pub fn topic(&self) -> Option<&str> {
        match &self.target {
            OutputTarget::Topic { name } => Some(name),
            OutputTarget::Console => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    Source(SourceNode),
    Filter(FilterNode),
    Project(ProjectNode),
    Join(JoinNode),
    Output(OutputNode),
}

impl PlanNode {
    pub fn id(&self) -> NodeId {
        match self {
            PlanNode::Source(n) => n.id,
            PlanNode::Filter(n) => n.id,
            PlanNode::Project(n) => n.id,
            PlanNode::Join(n) => n.id,
            PlanNode::Output(n) => n.id,
        }
    }

    /// Output row shape of this node.
    pub fn schema(&self) -> &Schema {
        match self {
            PlanNode::Source(n) => &n.schema,
            PlanNode::Filter(n) => n.source.schema(),
            PlanNode::Project(n) => &n.schema,
            PlanNode::Join(n) => &n.schema,
            PlanNode::Output(n) => n.source.schema(),
        }
    }

    /// Children in declaration order (left before right for joins).
    pub fn sources(&self) -> Vec<&PlanNode> {
        match self {
            PlanNode::Source(_) => vec![],
            PlanNode::Filter(n) => vec![n.source.as_ref()],
            PlanNode::Project(n) => vec![n.source.as_ref()],
            PlanNode::Join(n) => vec![n.left.as_ref(), n.right.as_ref()],
            PlanNode::Output(n) => vec![n.source.as_ref()],
        }
    }

    /// Variant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PlanNode::Source(n) => match n.source_type {
                DataSourceType::Stream => "Source(stream)",
                DataSourceType::Table => "Source(table)",
            },
            PlanNode::Filter(_) => "Filter",
            PlanNode::Project(_) => "Project",
            PlanNode::Join(_) => "Join",
            PlanNode::Output(n) => match n.target {
                OutputTarget::Topic { .. } => "Output(sink)",
                OutputTarget::Console => "Output(console)",
            },
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.sources().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        1 + self.sources().iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Indented, one-node-per-line rendering of the subtree.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(0, &mut out);
        out
    }

    fn explain_into(&self, indent: usize, out: &mut String) {
        use std::fmt::Write as _;
        let pad = "  ".repeat(indent);
        let detail = match self {
            PlanNode::Source(n) => format!(
                "topic={} key={} codec={}",
                n.topic, n.key_field.name, n.codec
            ),
            PlanNode::Filter(n) => format!("predicate={}", n.predicate),
            PlanNode::Project(n) => {
                let items: Vec<String> = n
                    .expressions
                    .iter()
                    .zip(n.schema.fields.iter())
                    .map(|(e, f)| format!("{} AS {}", e, f.name))
                    .collect();
                items.join(", ")
            }
            PlanNode::Join(n) => format!(
                "{} ON {}.{} = {}.{}",
                n.join_type, n.left_alias, n.left_key_field_name, n.right_alias, n.right_key_field_name
            ),
            PlanNode::Output(n) => match &n.target {
                OutputTarget::Topic { name } => format!("topic={}", name),
                OutputTarget::Console => "console".to_string(),
            },
        };
        let _ = writeln!(out, "{}{} {}: {}", pad, self.kind_name(), self.id(), detail);
        for child in self.sources() {
            child.explain_into(indent + 1, out);
        }
    }
}
