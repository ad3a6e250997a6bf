//! `TopologyBuilder`: the in-tree `DataflowBuilder` that records stages.
//!
//! Stage ids are the position of the stage in the topology, so every input
//! id is strictly smaller than the id of the stage consuming it.

use serde::{Deserialize, Serialize};
use streamc_core::expr::Expr;
use streamc_core::hash::{hash_serde, Hash256};
use streamc_core::id::StageId;
use streamc_core::schema::Schema;

use crate::error::{DataflowError, Result};
use crate::serde_registry::RowSerde;
use crate::stage::{Stage, StageKind, StageOp};
use crate::traits::DataflowBuilder;

/// Ordered list of stages; inputs always precede their consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub stages: Vec<Stage>,
}

impl Topology {
    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        usize::try_from(id.get())
            .ok()
            .and_then(|idx| self.stages.get(idx))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of stages whose op has the given name (see `StageOp::name`).
    pub fn count_ops(&self, name: &str) -> usize {
        self.stages.iter().filter(|s| s.op.name() == name).count()
    }

    pub fn sinks(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.op.is_terminal())
    }

    pub fn sources(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.op.is_source())
    }

    /// Stable content hash of the whole topology.
    pub fn fingerprint(&self) -> streamc_core::error::Result<Hash256> {
        hash_serde(&self.stages)
    }

    /// One line per stage, in id order.
    pub fn describe(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Default)]
pub struct TopologyBuilder {
    stages: Vec<Stage>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, id: StageId) -> Result<&Stage> {
        usize::try_from(id.get())
            .ok()
            .and_then(|idx| self.stages.get(idx))
            .ok_or(DataflowError::UnknownStage(id))
    }

    pub fn finish(self) -> Topology {
        Topology {
            stages: self.stages,
        }
    }

    fn push(
        &mut self,
        op: StageOp,
        inputs: Vec<StageId>,
        schema: Schema,
        key_field: String,
        kind: StageKind,
    ) -> StageId {
        let id = StageId::new(self.stages.len() as u64);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            stage = id.get(),
            op = op.name(),
            kind = %kind,
            key = %key_field,
            "dataflow stage recorded"
        );
        self.stages.push(Stage {
            id,
            op,
            inputs,
            schema,
            key_field,
            kind,
        });
        id
    }

    fn check_key(schema: &Schema, key_field: &str, stage: StageId) -> Result<String> {
        schema
            .field_by_name(key_field)
            .map(|f| f.name.clone())
            .ok_or_else(|| DataflowError::MissingField {
                stage,
                field: key_field.to_string(),
            })
    }

    fn next_id(&self) -> StageId {
        StageId::new(self.stages.len() as u64)
    }
}

impl DataflowBuilder for TopologyBuilder {
    fn stream(
        &mut self,
        topic: &str,
        serde: RowSerde,
        schema: &Schema,
        key_field: &str,
    ) -> Result<StageId> {
        let key = Self::check_key(schema, key_field, self.next_id())?;
        let op = StageOp::StreamSource {
            topic: topic.to_string(),
            serde,
        };
        Ok(self.push(op, Vec::new(), schema.clone(), key, StageKind::Stream))
    }

    fn table(
        &mut self,
        topic: &str,
        serde: RowSerde,
        store: &str,
        schema: &Schema,
        key_field: &str,
    ) -> Result<StageId> {
        let key = Self::check_key(schema, key_field, self.next_id())?;
        let op = StageOp::TableSource {
            topic: topic.to_string(),
            serde,
            store: store.to_string(),
        };
        Ok(self.push(op, Vec::new(), schema.clone(), key, StageKind::Table))
    }

    fn filter(&mut self, input: StageId, predicate: &Expr) -> Result<StageId> {
        let parent = self.stage(input)?;
        let (schema, key, kind) = (parent.schema.clone(), parent.key_field.clone(), parent.kind);
        let op = StageOp::Filter {
            predicate: predicate.clone(),
        };
        Ok(self.push(op, vec![input], schema, key, kind))
    }

    fn project(
        &mut self,
        input: StageId,
        expressions: &[Expr],
        schema: &Schema,
        key_field: &str,
    ) -> Result<StageId> {
        let kind = self.stage(input)?.kind;
        // Records keep their input keys, so the key may be absent from the projection.
        let key = schema
            .field_by_name(key_field)
            .map_or_else(|| key_field.to_string(), |f| f.name.clone());
        let op = StageOp::Project {
            expressions: expressions.to_vec(),
        };
        Ok(self.push(op, vec![input], schema.clone(), key, kind))
    }

    fn select_key(&mut self, input: StageId, key_field: &str) -> Result<StageId> {
        let schema = self.stage(input)?.schema.clone();
        let key = Self::check_key(&schema, key_field, input)?;
        let op = StageOp::SelectKey {
            key_field: key.clone(),
        };
        Ok(self.push(op, vec![input], schema, key, StageKind::Stream))
    }

    fn left_join(
        &mut self,
        stream: StageId,
        table: StageId,
        schema: &Schema,
        key_field: &str,
        serde: RowSerde,
    ) -> Result<StageId> {
        self.stage(stream)?;
        if self.stage(table)?.kind != StageKind::Table {
            return Err(DataflowError::NotATable(table));
        }
        let key = Self::check_key(schema, key_field, self.next_id())?;
        let op = StageOp::LeftJoin { serde };
        Ok(self.push(op, vec![stream, table], schema.clone(), key, StageKind::Stream))
    }

    fn to_topic(&mut self, input: StageId, topic: &str, serde: RowSerde) -> Result<StageId> {
        let parent = self.stage(input)?;
        let (schema, key, kind) = (parent.schema.clone(), parent.key_field.clone(), parent.kind);
        let op = StageOp::ToTopic {
            topic: topic.to_string(),
            serde,
        };
        Ok(self.push(op, vec![input], schema, key, kind))
    }

    fn print(&mut self, input: StageId) -> Result<StageId> {
        let parent = self.stage(input)?;
        let (schema, key, kind) = (parent.schema.clone(), parent.key_field.clone(), parent.kind);
        Ok(self.push(StageOp::Print, vec![input], schema, key, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamc_core::codec::CodecDescriptor;
    use streamc_core::schema::{DataType, Field};
    use streamc_core::types::Scalar;

    fn orders() -> Schema {
        Schema::new(vec![
            Field::new("order_id", DataType::Int64, false),
            Field::new("user_id", DataType::Int64, false),
            Field::new("amount", DataType::Float64, true),
        ])
    }

    fn users() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ])
    }

    fn json() -> RowSerde {
        RowSerde::new(CodecDescriptor::Json)
    }

    #[test]
    fn stage_ids_follow_creation_order() {
        let mut b = TopologyBuilder::new();
        let s = b.stream("orders", json(), &orders(), "order_id").unwrap();
        let f = b
            .filter(s, &Expr::col("amount").gt(Expr::lit(Scalar::F64(10.0))))
            .unwrap();
        let out = b.to_topic(f, "big_orders", json()).unwrap();
        assert_eq!((s.get(), f.get(), out.get()), (0, 1, 2));

        let topo = b.finish();
        assert_eq!(topo.len(), 3);
        assert_eq!(topo.stage(f).unwrap().inputs, vec![s]);
        assert_eq!(topo.sinks().count(), 1);
        assert_eq!(topo.sources().count(), 1);
        assert_eq!(topo.count_ops("filter"), 1);
    }

    #[test]
    fn source_key_is_checked_case_insensitively() {
        let mut b = TopologyBuilder::new();
        let s = b.stream("orders", json(), &orders(), "ORDER_ID").unwrap();
        assert_eq!(b.stage(s).unwrap().key_field, "order_id");

        let err = b.stream("orders", json(), &orders(), "missing").unwrap_err();
        assert!(matches!(err, DataflowError::MissingField { field, .. } if field == "missing"));
    }

    #[test]
    fn select_key_always_yields_a_stream() {
        let mut b = TopologyBuilder::new();
        let t = b.table("users", json(), "users_store", &users(), "id").unwrap();
        let r = b.select_key(t, "name").unwrap();
        let stage = b.stage(r).unwrap();
        assert_eq!(stage.kind, StageKind::Stream);
        assert_eq!(stage.key_field, "name");
        assert_eq!(stage.schema, users());
    }

    #[test]
    fn project_keeps_input_key_and_kind() {
        let mut b = TopologyBuilder::new();
        let t = b.table("users", json(), "users_store", &users(), "id").unwrap();
        let names = Schema::new(vec![Field::new("name", DataType::Utf8, true)]);
        let p = b.project(t, &[Expr::col("name")], &names, "id").unwrap();
        let stage = b.stage(p).unwrap();
        assert_eq!(stage.kind, StageKind::Table);
        assert_eq!(stage.key_field, "id");
        assert_eq!(stage.schema, names);

        let renamed = Schema::new(vec![Field::new("ID", DataType::Int64, false)]);
        let p = b.project(t, &[Expr::col("id")], &renamed, "id").unwrap();
        assert_eq!(b.stage(p).unwrap().key_field, "ID");
    }

    #[test]
    fn left_join_requires_table_on_the_right() {
        let mut b = TopologyBuilder::new();
        let s = b.stream("orders", json(), &orders(), "user_id").unwrap();
        let other = b.stream("users", json(), &users(), "id").unwrap();
        let joined = orders().qualified("o").concat(&users().qualified("u"));

        let err = b
            .left_join(s, other, &joined, "o.user_id", json())
            .unwrap_err();
        assert!(matches!(err, DataflowError::NotATable(id) if id == other));

        let t = b.table("users", json(), "users_store", &users(), "id").unwrap();
        let j = b.left_join(s, t, &joined, "o.user_id", json()).unwrap();
        let stage = b.stage(j).unwrap();
        assert_eq!(stage.inputs, vec![s, t]);
        assert_eq!(stage.kind, StageKind::Stream);
    }

    #[test]
    fn unknown_inputs_are_rejected() {
        let mut b = TopologyBuilder::new();
        let err = b.print(StageId::new(7)).unwrap_err();
        assert!(matches!(err, DataflowError::UnknownStage(id) if id.get() == 7));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let build = |sink: &str| {
            let mut b = TopologyBuilder::new();
            let s = b.stream("orders", json(), &orders(), "order_id").unwrap();
            b.to_topic(s, sink, json()).unwrap();
            b.finish()
        };
        let a = build("out").fingerprint().unwrap();
        assert_eq!(a, build("out").fingerprint().unwrap());
        assert_ne!(a, build("other").fingerprint().unwrap());
    }

    #[test]
    fn describe_lists_every_stage() {
        let mut b = TopologyBuilder::new();
        let t = b.table("users", json(), "users_store", &users(), "id").unwrap();
        b.print(t).unwrap();
        let text = b.finish().describe();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#0 table_source [table] key=id"));
        assert!(lines[0].contains("users as JSON into users_store"));
        assert!(lines[1].starts_with("#1 print [table] key=id <- [0]"));
    }

    #[test]
    fn topology_serializes_as_json() {
        let mut b = TopologyBuilder::new();
        b.stream("orders", json(), &orders(), "order_id").unwrap();
        let topo = b.finish();
        let text = serde_json::to_string(&topo).unwrap();
        assert!(text.contains("\"op\":\"stream_source\""));
        let back: Topology = serde_json::from_str(&text).unwrap();
        assert_eq!(back, topo);
    }
}
