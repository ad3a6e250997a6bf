//! Capability traits the compiler is written against.
//!
//! Every factory returns an opaque `StageId`. Implementations must allocate
//! ids monotonically so that a stage's inputs always precede it; runtimes
//! wiring the dataflow rely on that order.

use streamc_core::codec::CodecDescriptor;
use streamc_core::expr::Expr;
use streamc_core::id::StageId;
use streamc_core::schema::Schema;

use crate::error::Result;
use crate::serde_registry::RowSerde;

/// Factory surface of a streaming runtime.
pub trait DataflowBuilder {
    /// Open an unbounded keyed stream over `topic`.
    fn stream(&mut self, topic: &str, serde: RowSerde, schema: &Schema, key_field: &str)
        -> Result<StageId>;

    /// Open a keyed table over `topic`, materialized into `store`.
    fn table(
        &mut self,
        topic: &str,
        serde: RowSerde,
        store: &str,
        schema: &Schema,
        key_field: &str,
    ) -> Result<StageId>;

    /// Drop rows for which `predicate` is not true. Kind, schema and key are kept.
    fn filter(&mut self, input: StageId, predicate: &Expr) -> Result<StageId>;

    /// Map rows through `expressions` into `schema`. Kind is kept.
    fn project(
        &mut self,
        input: StageId,
        expressions: &[Expr],
        schema: &Schema,
        key_field: &str,
    ) -> Result<StageId>;

    /// Re-derive the record key from `key_field`; row content is unchanged.
    fn select_key(&mut self, input: StageId, key_field: &str) -> Result<StageId>;

    /// Left-outer join of `stream` against the materialized `table`.
    fn left_join(
        &mut self,
        stream: StageId,
        table: StageId,
        schema: &Schema,
        key_field: &str,
        serde: RowSerde,
    ) -> Result<StageId>;

    /// Terminal write of every row to `topic`.
    fn to_topic(&mut self, input: StageId, topic: &str, serde: RowSerde) -> Result<StageId>;

    /// Terminal human-readable trace of every row.
    fn print(&mut self, input: StageId) -> Result<StageId>;
}

/// Codec lookup owned by the serialization subsystem.
pub trait SerdeRegistry {
    fn row_serde(&self, codec: &CodecDescriptor) -> Result<RowSerde>;
}
