//! Source records for the reference runner.
//!
//! Rows are positional and must match the schema of the source stage that
//! reads their topic. `from_json` converts the CLI's input document
//! (`{ "<topic>": [ { "<field>": <value>, ... }, ... ] }`) using those schemas.

use std::collections::BTreeMap;

use serde_json::Value;
use streamc_core::schema::{DataType, Schema};
use streamc_core::types::{Row, Scalar};
use streamc_dataflow::{StageOp, Topology};

use crate::runtime::ExecError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    topics: BTreeMap<String, Vec<Row>>,
}

impl SourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows for `topic`, in arrival order.
    pub fn push_rows(&mut self, topic: impl Into<String>, rows: impl IntoIterator<Item = Row>) {
        self.topics.entry(topic.into()).or_default().extend(rows);
    }

    pub fn with_rows(mut self, topic: impl Into<String>, rows: Vec<Row>) -> Self {
        self.push_rows(topic, rows);
        self
    }

    /// Rows for `topic`; unknown topics are empty.
    pub fn rows(&self, topic: &str) -> &[Row] {
        self.topics.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Parse the JSON input document against the source schemas of `topology`.
    pub fn from_json(doc: &Value, topology: &Topology) -> Result<Self, ExecError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| ExecError::Input("input must be an object of topic -> rows".into()))?;

        let mut data = SourceData::new();
        for stage in topology.sources() {
            let topic = match &stage.op {
                StageOp::StreamSource { topic, .. } | StageOp::TableSource { topic, .. } => topic,
                _ => continue,
            };
            if data.topics.contains_key(topic) {
                continue;
            }
            let Some(records) = obj.get(topic) else {
                continue;
            };
            let records = records.as_array().ok_or_else(|| {
                ExecError::Input(format!("rows for topic '{}' must be an array", topic))
            })?;
            let rows = records
                .iter()
                .map(|r| json_row(r, &stage.schema, topic))
                .collect::<Result<Vec<_>, _>>()?;
            data.push_rows(topic.clone(), rows);
        }
        Ok(data)
    }

    pub fn from_json_str(src: &str, topology: &Topology) -> Result<Self, ExecError> {
        let doc: Value = serde_json::from_str(src)?;
        Self::from_json(&doc, topology)
    }
}

fn json_row(record: &Value, schema: &Schema, topic: &str) -> Result<Row, ExecError> {
    let obj = record
        .as_object()
        .ok_or_else(|| ExecError::Input(format!("row in topic '{}' is not an object", topic)))?;
    let mut values = Vec::with_capacity(schema.len());
    for field in &schema.fields {
        let raw = obj
            .iter()
            .find(|(k, _)| field.name_matches(k))
            .map(|(_, v)| v)
            .unwrap_or(&Value::Null);
        let value = json_scalar(raw, field.data_type).ok_or_else(|| {
            ExecError::Input(format!(
                "value {} for field '{}' in topic '{}' is not {}",
                raw, field.name, topic, field.data_type
            ))
        })?;
        if value.is_null() && !field.nullable {
            return Err(ExecError::Input(format!(
                "field '{}' in topic '{}' is not nullable",
                field.name, topic
            )));
        }
        values.push(value);
    }
    Ok(Row::new(values))
}

fn json_scalar(v: &Value, ty: DataType) -> Option<Scalar> {
    if v.is_null() {
        return Some(Scalar::Null);
    }
    Some(match ty {
        DataType::Boolean => Scalar::Bool(v.as_bool()?),
        DataType::Int32 => Scalar::I32(i32::try_from(v.as_i64()?).ok()?),
        DataType::Int64 => Scalar::I64(v.as_i64()?),
        DataType::Float32 => Scalar::F32(v.as_f64()? as f32),
        DataType::Float64 => Scalar::F64(v.as_f64()?),
        DataType::Utf8 => Scalar::Str(v.as_str()?.to_string()),
        DataType::Binary => match v {
            Value::String(s) => Scalar::Bin(s.as_bytes().to_vec()),
            Value::Array(items) => Scalar::Bin(
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()?,
            ),
            _ => return None,
        },
    })
}
