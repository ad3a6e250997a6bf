//! Runtime: evaluate a `Topology` over in-memory records.
//!
//! Behavior:
//! - Table sources keep the latest row per key (first-seen key order).
//! - Stream stages preserve input order.
//! - `project` maps rows one to one; records keep their input keys.
//! - `select_key` re-derives the record key; row content is untouched.
//! - `left_join` pairs each stream record with the table row of the same
//!   key, filling the right side with nulls when there is none.
//! - `to_topic` collects rows per destination; `print` renders
//!   `key | v1, v2` lines, capped by `console_row_limit`.

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use streamc_core::config::CompilerConfig;
use streamc_core::expr::Expr;
use streamc_core::id::StageId;
use streamc_core::manifest::RunManifest;
use streamc_core::schema::Schema;
use streamc_core::types::{Row, Scalar};
use streamc_dataflow::{Stage, StageKind, StageOp, Topology};

use crate::input::SourceData;
use crate::metrics::emit_span;
use crate::replay::hash_topology;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("stage {stage}: {message}")]
    Eval { stage: StageId, message: String },
    #[error("stage {stage} reads stage {input}, which has not been evaluated")]
    MissingInput { stage: StageId, input: StageId },
    #[error("invalid input: {0}")]
    Input(String),
    #[error("hashing error: {0}")]
    Hash(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A keyed row. Keys are the string rendering of the key field's value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub key: String,
    pub row: Row,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {}", self.key, self.row)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// Rows written per destination topic, in write order.
    pub sink_rows: BTreeMap<String, Vec<Record>>,
    /// Rendered console lines.
    pub console: Vec<String>,
    pub manifest: RunManifest,
}

impl RunOutput {
    pub fn rows_for(&self, topic: &str) -> &[Record] {
        self.sink_rows.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalRunner {
    console_row_limit: Option<usize>,
}

impl LocalRunner {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            console_row_limit: config.console_row_limit,
        }
    }

    pub fn with_console_limit(limit: Option<usize>) -> Self {
        Self {
            console_row_limit: limit,
        }
    }

    pub fn run(&self, topology: &Topology, data: &SourceData) -> Result<RunOutput, ExecError> {
        let manifest = RunManifest::new(hash_topology(topology)?, now_millis());

        let mut results: Vec<Vec<Record>> = Vec::with_capacity(topology.len());
        let mut sink_rows: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        let mut console = Vec::new();
        let mut rows_in = 0u64;
        let mut rows_out = 0u64;

        for stage in &topology.stages {
            let out = match &stage.op {
                StageOp::StreamSource { topic, .. } | StageOp::TableSource { topic, .. } => {
                    let rows = data.rows(topic);
                    rows_in += rows.len() as u64;
                    let records = keyed(stage, &stage.schema, rows.iter().cloned())?;
                    if stage.kind == StageKind::Table {
                        latest_per_key(records)
                    } else {
                        records
                    }
                }
                StageOp::Filter { predicate } => {
                    let input = input_of(stage, 0, &results, topology)?;
                    filter(stage, &input.schema, predicate, &results[index(input.id)])?
                }
                StageOp::Project { expressions } => {
                    let input = input_of(stage, 0, &results, topology)?;
                    results[index(input.id)]
                        .iter()
                        .map(|r| {
                            Ok(Record {
                                key: r.key.clone(),
                                row: project(stage, &input.schema, expressions, &r.row)?,
                            })
                        })
                        .collect::<Result<Vec<_>, ExecError>>()?
                }
                StageOp::SelectKey { .. } => {
                    let input = input_of(stage, 0, &results, topology)?;
                    let rows = results[index(input.id)].iter().map(|r| r.row.clone());
                    keyed(stage, &stage.schema, rows)?
                }
                StageOp::LeftJoin { .. } => {
                    let left = input_of(stage, 0, &results, topology)?;
                    let right = input_of(stage, 1, &results, topology)?;
                    left_join(
                        stage,
                        &results[index(left.id)],
                        &results[index(right.id)],
                        right.schema.len(),
                    )?
                }
                StageOp::ToTopic { topic, .. } => {
                    let input = input_of(stage, 0, &results, topology)?;
                    let records = results[index(input.id)].clone();
                    rows_out += records.len() as u64;
                    sink_rows
                        .entry(topic.clone())
                        .or_default()
                        .extend(records.iter().cloned());
                    records
                }
                StageOp::Print => {
                    let input = input_of(stage, 0, &results, topology)?;
                    let records = results[index(input.id)].clone();
                    rows_out += records.len() as u64;
                    let limit = self.console_row_limit.unwrap_or(usize::MAX);
                    console.extend(records.iter().take(limit).map(|r| r.to_string()));
                    records
                }
            };

            #[cfg(feature = "tracing")]
            tracing::trace!(stage = stage.id.get(), op = stage.op.name(), rows = out.len(), "evaluated stage");

            emit_span(
                "stage",
                &[
                    ("id", stage.id.get().to_string()),
                    ("op", stage.op.name().to_string()),
                    ("rows", out.len().to_string()),
                ],
            );
            results.push(out);
        }

        let manifest = manifest.finish(now_millis(), rows_in, rows_out);
        Ok(RunOutput {
            sink_rows,
            console,
            manifest,
        })
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn index(id: StageId) -> usize {
    id.get() as usize
}

/// Input stage `pos` of `stage`, which must already have been evaluated.
fn input_of<'t>(
    stage: &Stage,
    pos: usize,
    results: &[Vec<Record>],
    topology: &'t Topology,
) -> Result<&'t Stage, ExecError> {
    let id = stage.inputs.get(pos).copied().ok_or_else(|| ExecError::Eval {
        stage: stage.id,
        message: format!("missing input #{}", pos),
    })?;
    match topology.stage(id) {
        Some(input) if index(id) < results.len() => Ok(input),
        _ => Err(ExecError::MissingInput {
            stage: stage.id,
            input: id,
        }),
    }
}

fn eval_err(stage: &Stage, e: impl std::fmt::Display) -> ExecError {
    ExecError::Eval {
        stage: stage.id,
        message: e.to_string(),
    }
}

/// Attach keys taken from `stage.key_field` within `schema`.
fn keyed(
    stage: &Stage,
    schema: &Schema,
    rows: impl IntoIterator<Item = Row>,
) -> Result<Vec<Record>, ExecError> {
    let idx = schema
        .index_of_ignore_case(&stage.key_field)
        .ok_or_else(|| eval_err(stage, format!("key field '{}' not in {}", stage.key_field, schema)))?;
    rows.into_iter()
        .map(|row| {
            if row.len() != schema.len() {
                return Err(eval_err(
                    stage,
                    format!("row has {} values, schema {} has {}", row.len(), schema, schema.len()),
                ));
            }
            let key = row.get(idx).map(Scalar::to_string).unwrap_or_default();
            Ok(Record { key, row })
        })
        .collect()
}

/// Collapse a changelog into its latest row per key.
fn latest_per_key(records: Vec<Record>) -> Vec<Record> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Record> = Vec::new();
    for rec in records {
        match slots.get(&rec.key) {
            Some(&i) => out[i] = rec,
            None => {
                slots.insert(rec.key.clone(), out.len());
                out.push(rec);
            }
        }
    }
    out
}

fn filter(
    stage: &Stage,
    schema: &Schema,
    predicate: &Expr,
    input: &[Record],
) -> Result<Vec<Record>, ExecError> {
    let mut out = Vec::new();
    for rec in input {
        if predicate
            .eval_predicate(schema, &rec.row)
            .map_err(|e| eval_err(stage, e))?
        {
            out.push(rec.clone());
        }
    }
    Ok(out)
}

fn project(stage: &Stage, schema: &Schema, expressions: &[Expr], row: &Row) -> Result<Row, ExecError> {
    expressions
        .iter()
        .map(|e| e.eval(schema, row))
        .collect::<Result<Vec<_>, _>>()
        .map(Row::new)
        .map_err(|e| eval_err(stage, e))
}

fn left_join(
    stage: &Stage,
    stream: &[Record],
    table: &[Record],
    right_width: usize,
) -> Result<Vec<Record>, ExecError> {
    let lookup: HashMap<&str, &Row> = table.iter().map(|r| (r.key.as_str(), &r.row)).collect();
    let missing = Row::nulls(right_width);
    let rows = stream.iter().map(|rec| {
        let right = lookup.get(rec.key.as_str()).copied().unwrap_or(&missing);
        rec.row.concat(right)
    });
    keyed(stage, &stage.schema, rows)
}
