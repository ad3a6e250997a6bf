//! Logical plan surface re-exported from core, plus a fluent builder.
//!
//! `PlanBuilder` hands out `NodeId`s in construction order, so children
//! always carry smaller ids than their parents.

pub use streamc_core::codec::CodecDescriptor;
pub use streamc_core::dag::{
    DataSourceType, FilterNode, JoinNode, JoinType, OutputNode, OutputTarget, PlanNode,
    ProjectNode, SourceNode,
};
pub use streamc_core::schema::{DataType, Field, Schema};

use streamc_core::error::Result;
use streamc_core::expr::{parse_expr, Expr};
use streamc_core::id::NodeId;

#[derive(Debug, Clone)]
pub struct PlanBuilder {
    next_id: u64,
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn source(
        &mut self,
        topic: &str,
        schema: Schema,
        key_field: &str,
        source_type: DataSourceType,
        codec: CodecDescriptor,
    ) -> Result<PlanNode> {
        let id = self.next_id();
        Ok(PlanNode::Source(SourceNode::new(
            id,
            topic,
            schema,
            key_field,
            source_type,
            codec,
        )?))
    }

    pub fn stream(
        &mut self,
        topic: &str,
        schema: Schema,
        key_field: &str,
        codec: CodecDescriptor,
    ) -> Result<PlanNode> {
        self.source(topic, schema, key_field, DataSourceType::Stream, codec)
    }

    pub fn table(
        &mut self,
        topic: &str,
        schema: Schema,
        key_field: &str,
        codec: CodecDescriptor,
    ) -> Result<PlanNode> {
        self.source(topic, schema, key_field, DataSourceType::Table, codec)
    }

    pub fn filter_expr(&mut self, input: PlanNode, predicate: Expr) -> Result<PlanNode> {
        let id = self.next_id();
        Ok(PlanNode::Filter(FilterNode::new(id, input, predicate)?))
    }

    /// Filter with a predicate given in expression syntax.
    pub fn filter(&mut self, input: PlanNode, predicate: &str) -> Result<PlanNode> {
        let predicate = parse_expr(predicate)?;
        self.filter_expr(input, predicate)
    }

    /// Project `(expression, alias)` pairs given in expression syntax.
    pub fn project(&mut self, input: PlanNode, items: &[(&str, &str)]) -> Result<PlanNode> {
        let items = items
            .iter()
            .map(|(expr, alias)| Ok((parse_expr(expr)?, alias.to_string())))
            .collect::<Result<Vec<_>>>()?;
        let id = self.next_id();
        Ok(PlanNode::Project(ProjectNode::from_aliased(id, input, items)?))
    }

    /// Keep the named columns unchanged, in the given order.
    pub fn select(&mut self, input: PlanNode, columns: &[&str]) -> Result<PlanNode> {
        let items: Vec<(&str, &str)> = columns.iter().map(|c| (*c, *c)).collect();
        self.project(input, &items)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn join(
        &mut self,
        join_type: JoinType,
        left: PlanNode,
        right: PlanNode,
        left_key: &str,
        right_key: &str,
        left_alias: &str,
        right_alias: &str,
    ) -> Result<PlanNode> {
        let id = self.next_id();
        Ok(PlanNode::Join(JoinNode::new(
            id,
            join_type,
            left,
            right,
            left_key,
            right_key,
            left_alias,
            right_alias,
        )?))
    }

    pub fn to_topic(&mut self, input: PlanNode, name: &str) -> PlanNode {
        let id = self.next_id();
        PlanNode::Output(OutputNode::new(
            id,
            input,
            OutputTarget::Topic {
                name: name.to_string(),
            },
        ))
    }

    pub fn to_console(&mut self, input: PlanNode) -> PlanNode {
        let id = self.next_id();
        PlanNode::Output(OutputNode::new(id, input, OutputTarget::Console))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("value", DataType::Int64, true),
        ])
    }

    #[test]
    fn ids_follow_construction_order() {
        let mut b = PlanBuilder::new();
        let src = b.stream("events", schema(), "id", CodecDescriptor::Json).unwrap();
        let filtered = b.filter(src, "value > 10").unwrap();
        let projected = b.select(filtered, &["id"]).unwrap();
        let root = b.to_topic(projected, "out");

        assert_eq!(root.id(), NodeId::new(4));
        let project = root.sources()[0];
        assert_eq!(project.id(), NodeId::new(3));
        assert_eq!(project.schema().names().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(project.sources()[0].sources()[0].id(), NodeId::new(1));
    }

    #[test]
    fn project_infers_types() {
        let mut b = PlanBuilder::new();
        let src = b.stream("events", schema(), "id", CodecDescriptor::Json).unwrap();
        let p = b
            .project(src, &[("value * 1.5", "scaled"), ("value > 3", "big")])
            .unwrap();
        let types: Vec<_> = p.schema().fields.iter().map(|f| f.data_type).collect();
        assert_eq!(types, vec![DataType::Float64, DataType::Boolean]);
    }

    #[test]
    fn bad_predicate_surfaces_core_error() {
        let mut b = PlanBuilder::new();
        let src = b.stream("events", schema(), "id", CodecDescriptor::Json).unwrap();
        assert!(b.filter(src, "nope >").is_err());
    }
}
