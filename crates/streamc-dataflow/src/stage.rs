//! Recorded dataflow stages.

use std::fmt;

use serde::{Deserialize, Serialize};
use streamc_core::expr::Expr;
use streamc_core::id::StageId;
use streamc_core::schema::Schema;

use crate::serde_registry::RowSerde;

/// Whether a stage produces an append-only stream or a keyed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Stream,
    Table,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Stream => f.write_str("stream"),
            StageKind::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageOp {
    StreamSource {
        topic: String,
        serde: RowSerde,
    },
    TableSource {
        topic: String,
        serde: RowSerde,
        store: String,
    },
    Filter {
        predicate: Expr,
    },
    Project {
        expressions: Vec<Expr>,
    },
    SelectKey {
        key_field: String,
    },
    /// Inputs are `[stream, table]`.
    LeftJoin {
        serde: RowSerde,
    },
    ToTopic {
        topic: String,
        serde: RowSerde,
    },
    Print,
}

impl StageOp {
    pub fn name(&self) -> &'static str {
        match self {
            StageOp::StreamSource { .. } => "stream_source",
            StageOp::TableSource { .. } => "table_source",
            StageOp::Filter { .. } => "filter",
            StageOp::Project { .. } => "project",
            StageOp::SelectKey { .. } => "select_key",
            StageOp::LeftJoin { .. } => "left_join",
            StageOp::ToTopic { .. } => "to_topic",
            StageOp::Print => "print",
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, StageOp::StreamSource { .. } | StageOp::TableSource { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StageOp::ToTopic { .. } | StageOp::Print)
    }

    fn detail(&self) -> String {
        match self {
            StageOp::StreamSource { topic, serde } => format!("{} as {}", topic, serde.value),
            StageOp::TableSource {
                topic,
                serde,
                store,
            } => format!("{} as {} into {}", topic, serde.value, store),
            StageOp::Filter { predicate } => predicate.to_string(),
            StageOp::Project { expressions } => expressions
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            StageOp::SelectKey { key_field } => key_field.clone(),
            StageOp::LeftJoin { serde } => format!("as {}", serde.value),
            StageOp::ToTopic { topic, serde } => format!("{} as {}", topic, serde.value),
            StageOp::Print => String::new(),
        }
    }
}

/// One node of a recorded topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub op: StageOp,
    pub inputs: Vec<StageId>,
    pub schema: Schema,
    pub key_field: String,
    pub kind: StageKind,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = self
            .inputs
            .iter()
            .map(|i| i.get().to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(
            f,
            "#{} {} [{}] key={} <- [{}]",
            self.id.get(),
            self.op.name(),
            self.kind,
            self.key_field,
            inputs
        )?;
        let detail = self.op.detail();
        if !detail.is_empty() {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}
