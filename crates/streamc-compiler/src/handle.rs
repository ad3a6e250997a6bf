//! Physical handles: the compiler's per-node result.
//!
//! A handle is either an unbounded keyed stream or a continuously updated
//! keyed table. Both carry the output schema, the key field and the dataflow
//! stage that produces them. Operations consume the handle and return the
//! handle of the stage they append.

use serde::{Deserialize, Serialize};
use streamc_core::expr::Expr;
use streamc_core::id::StageId;
use streamc_core::schema::{Field, Schema};
use streamc_dataflow::{DataflowBuilder, RowSerde};

pub use streamc_dataflow::StageKind as HandleKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleInfo {
    pub schema: Schema,
    pub key_field: Field,
    pub stage: StageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PhysicalHandle {
    Stream(HandleInfo),
    Table(HandleInfo),
}

impl PhysicalHandle {
    pub fn stream(schema: Schema, key_field: Field, stage: StageId) -> Self {
        PhysicalHandle::Stream(HandleInfo {
            schema,
            key_field,
            stage,
        })
    }

    pub fn table(schema: Schema, key_field: Field, stage: StageId) -> Self {
        PhysicalHandle::Table(HandleInfo {
            schema,
            key_field,
            stage,
        })
    }

    fn info(&self) -> &HandleInfo {
        match self {
            PhysicalHandle::Stream(i) | PhysicalHandle::Table(i) => i,
        }
    }

    pub fn kind(&self) -> HandleKind {
        match self {
            PhysicalHandle::Stream(_) => HandleKind::Stream,
            PhysicalHandle::Table(_) => HandleKind::Table,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, PhysicalHandle::Table(_))
    }

    pub fn schema(&self) -> &Schema {
        &self.info().schema
    }

    pub fn key_field(&self) -> &Field {
        &self.info().key_field
    }

    pub fn stage(&self) -> StageId {
        self.info().stage
    }

    /// Same kind, schema and key; new producing stage.
    fn with_stage(&self, stage: StageId) -> Self {
        let info = HandleInfo {
            stage,
            ..self.info().clone()
        };
        match self {
            PhysicalHandle::Stream(_) => PhysicalHandle::Stream(info),
            PhysicalHandle::Table(_) => PhysicalHandle::Table(info),
        }
    }

    fn with_parts(&self, schema: Schema, key_field: Field, stage: StageId) -> Self {
        match self {
            PhysicalHandle::Stream(_) => PhysicalHandle::stream(schema, key_field, stage),
            PhysicalHandle::Table(_) => PhysicalHandle::table(schema, key_field, stage),
        }
    }

    pub fn filter<B: DataflowBuilder>(
        &self,
        builder: &mut B,
        predicate: &Expr,
    ) -> streamc_dataflow::Result<Self> {
        let stage = builder.filter(self.stage(), predicate)?;
        Ok(self.with_stage(stage))
    }

    pub fn project<B: DataflowBuilder>(
        &self,
        builder: &mut B,
        expressions: &[Expr],
        schema: &Schema,
        key_field: Field,
    ) -> streamc_dataflow::Result<Self> {
        let stage = builder.project(self.stage(), expressions, schema, &key_field.name)?;
        Ok(self.with_parts(schema.clone(), key_field, stage))
    }

    /// Rekey. Row content is unchanged; the result is always a stream.
    pub fn select_key<B: DataflowBuilder>(
        &self,
        builder: &mut B,
        key_field: Field,
    ) -> streamc_dataflow::Result<Self> {
        let stage = builder.select_key(self.stage(), &key_field.name)?;
        Ok(PhysicalHandle::stream(self.schema().clone(), key_field, stage))
    }

    /// Left-outer join of `self` against `table`; the result is a stream.
    pub fn left_join<B: DataflowBuilder>(
        &self,
        builder: &mut B,
        table: &PhysicalHandle,
        schema: &Schema,
        key_field: Field,
        serde: RowSerde,
    ) -> streamc_dataflow::Result<Self> {
        let stage = builder.left_join(self.stage(), table.stage(), schema, &key_field.name, serde)?;
        Ok(PhysicalHandle::stream(schema.clone(), key_field, stage))
    }

    pub fn to_topic<B: DataflowBuilder>(
        &self,
        builder: &mut B,
        topic: &str,
        serde: RowSerde,
    ) -> streamc_dataflow::Result<Self> {
        let stage = builder.to_topic(self.stage(), topic, serde)?;
        Ok(self.with_stage(stage))
    }

    pub fn print<B: DataflowBuilder>(&self, builder: &mut B) -> streamc_dataflow::Result<Self> {
        let stage = builder.print(self.stage())?;
        Ok(self.with_stage(stage))
    }
}
