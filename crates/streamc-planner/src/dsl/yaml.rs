//! YAML → `PlanNode` loader for nested plan documents.
//!
//! Example:
//! ```yaml
//! config: { state_store_suffix: "_state" }
//! plan:
//!   op: output
//!   sink: "big_events"
//!   input:
//!     op: filter
//!     predicate: "value > 10"
//!     input:
//!       op: source
//!       topic: "events"
//!       mode: stream
//!       key: id
//!       format: json
//!       schema:
//!         - { name: "id",    type: "Int64", nullable: false }
//!         - { name: "value", type: "Int64", nullable: true }
//! ```
//!
//! Node ids are handed out by `PlanBuilder` while the tree is built, so
//! leaves get the smallest ids.

use serde::{Deserialize, Serialize};

use streamc_core::codec::CodecDescriptor;
use streamc_core::dag::{DataSourceType, JoinType, PlanNode};
use streamc_core::expr::parse_expr;
use streamc_core::schema::{DataType, Field, Schema};

use crate::error::{DslError, Result};
use crate::logical::PlanBuilder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub config: Option<PlanConfig>,
    pub plan: NodeDef,
}

/// Optional per-plan overrides of `CompilerConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub state_store_suffix: Option<String>,
    pub max_plan_depth: Option<usize>,
    pub console_row_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "op")]
pub enum NodeDef {
    Source {
        topic: String,
        #[serde(default = "default_mode")]
        mode: DataSourceType,
        key: String,
        #[serde(default = "default_format")]
        format: String,
        #[serde(default)]
        delimiter: Option<char>,
        #[serde(default)]
        avro_schema: Option<String>,
        schema: Vec<FieldDef>,
    },
    Filter {
        predicate: String,
        input: Box<NodeDef>,
    },
    Project {
        columns: Vec<ProjectItemDef>,
        input: Box<NodeDef>,
    },
    Join {
        #[serde(rename = "type", default = "default_join_type")]
        join_type: JoinType,
        left_key: String,
        right_key: String,
        left_alias: String,
        right_alias: String,
        left: Box<NodeDef>,
        right: Box<NodeDef>,
    },
    Output {
        #[serde(default)]
        sink: Option<String>,
        #[serde(default)]
        console: bool,
        input: Box<NodeDef>,
    },
}

fn default_mode() -> DataSourceType {
    DataSourceType::Stream
}

fn default_format() -> String {
    "json".to_string()
}

fn default_join_type() -> JoinType {
    JoinType::Left
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItemDef {
    pub expr: String,
    /// Defaults to the expression text (i.e. the column name for plain columns).
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedPlan {
    pub plan: PlanNode,
    pub config: PlanConfig,
}

fn to_schema(fields: &[FieldDef]) -> Result<Schema> {
    fields
        .iter()
        .map(|f| {
            let data_type = DataType::parse(&f.data_type).ok_or_else(|| {
                DslError::Invalid(format!("unknown type '{}' for field '{}'", f.data_type, f.name))
            })?;
            Ok(Field::new(f.name.clone(), data_type, f.nullable))
        })
        .collect::<Result<Vec<_>>>()
        .map(Schema::new)
}

fn to_codec(format: &str, delimiter: Option<char>, avro_schema: Option<String>) -> Result<CodecDescriptor> {
    match format.to_ascii_lowercase().as_str() {
        "json" => Ok(CodecDescriptor::Json),
        "delimited" | "csv" => Ok(CodecDescriptor::Delimited {
            delimiter: delimiter.unwrap_or(','),
        }),
        "avro" => {
            let schema = avro_schema
                .ok_or_else(|| DslError::Invalid("avro sources need 'avro_schema'".into()))?;
            Ok(CodecDescriptor::Avro { schema })
        }
        other => Err(DslError::Invalid(format!("unknown format '{}'", other))),
    }
}

fn build(def: NodeDef, b: &mut PlanBuilder) -> Result<PlanNode> {
    Ok(match def {
        NodeDef::Source {
            topic,
            mode,
            key,
            format,
            delimiter,
            avro_schema,
            schema,
        } => {
            let codec = to_codec(&format, delimiter, avro_schema)?;
            b.source(&topic, to_schema(&schema)?, &key, mode, codec)?
        }
        NodeDef::Filter { predicate, input } => {
            let input = build(*input, b)?;
            b.filter(input, &predicate)?
        }
        NodeDef::Project { columns, input } => {
            let input = build(*input, b)?;
            let items = columns
                .into_iter()
                .map(|item| {
                    let alias = item.alias.unwrap_or_else(|| item.expr.clone());
                    Ok((parse_expr(&item.expr)?, alias))
                })
                .collect::<Result<Vec<_>>>()?;
            let id = b.next_id();
            PlanNode::Project(streamc_core::dag::ProjectNode::from_aliased(id, input, items)?)
        }
        NodeDef::Join {
            join_type,
            left_key,
            right_key,
            left_alias,
            right_alias,
            left,
            right,
        } => {
            let left = build(*left, b)?;
            let right = build(*right, b)?;
            b.join(
                join_type,
                left,
                right,
                &left_key,
                &right_key,
                &left_alias,
                &right_alias,
            )?
        }
        NodeDef::Output {
            sink,
            console,
            input,
        } => {
            let input = build(*input, b)?;
            match (sink, console) {
                (Some(name), false) => b.to_topic(input, &name),
                (None, true) => b.to_console(input),
                (Some(_), true) => {
                    return Err(DslError::Invalid(
                        "output declares both 'sink' and 'console'".into(),
                    ))
                }
                (None, false) => {
                    return Err(DslError::Invalid(
                        "output needs either 'sink: <topic>' or 'console: true'".into(),
                    ))
                }
            }
        }
    })
}

/// Parse a YAML plan document into a `PlanNode` tree plus its config block.
pub fn parse_yaml_plan(yaml_src: &str) -> Result<ParsedPlan> {
    let doc: PlanDocument = serde_yaml::from_str(yaml_src)?;
    let mut builder = PlanBuilder::new();
    let plan = build(doc.plan, &mut builder)?;
    Ok(ParsedPlan {
        plan,
        config: doc.config.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamc_core::dag::OutputTarget;

    const JOIN_PLAN: &str = r#"
config:
  state_store_suffix: "_state"
plan:
  op: output
  console: true
  input:
    op: join
    left_key: user_id
    right_key: id
    left_alias: o
    right_alias: u
    left:
      op: source
      topic: orders
      key: order_id
      schema:
        - { name: order_id, type: Int64 }
        - { name: user_id, type: Int64 }
    right:
      op: source
      topic: users
      mode: table
      key: id
      format: delimited
      delimiter: "|"
      schema:
        - { name: id, type: Int64 }
        - { name: name, type: Utf8, nullable: true }
"#;

    #[test]
    fn parses_join_plan_with_defaults() {
        let parsed = parse_yaml_plan(JOIN_PLAN).unwrap();
        assert_eq!(parsed.config.state_store_suffix.as_deref(), Some("_state"));
        let PlanNode::Output(out) = &parsed.plan else {
            panic!("root should be an output");
        };
        assert_eq!(out.target, OutputTarget::Console);
        let PlanNode::Join(join) = out.source.as_ref() else {
            panic!("expected join");
        };
        assert_eq!(join.join_type, JoinType::Left);
        let names: Vec<_> = join.schema.names().collect();
        assert_eq!(names, vec!["o.order_id", "o.user_id", "u.id", "u.name"]);
        let PlanNode::Source(users) = join.right.as_ref() else {
            panic!("expected source");
        };
        assert_eq!(users.source_type, DataSourceType::Table);
        assert_eq!(users.codec, CodecDescriptor::Delimited { delimiter: '|' });
        assert_eq!(parsed.plan.node_count(), 4);
    }

    #[test]
    fn project_alias_defaults_to_expression_text() {
        let yaml = r#"
plan:
  op: output
  sink: out
  input:
    op: project
    columns:
      - { expr: id }
      - { expr: "value * 2", alias: doubled }
    input:
      op: source
      topic: events
      key: id
      schema:
        - { name: id, type: Int64 }
        - { name: value, type: Int32 }
"#;
        let parsed = parse_yaml_plan(yaml).unwrap();
        let names: Vec<_> = parsed.plan.schema().names().collect();
        assert_eq!(names, vec!["id", "doubled"]);
        assert_eq!(parsed.config, PlanConfig::default());
    }

    #[test]
    fn output_must_pick_exactly_one_target() {
        let yaml = r#"
plan:
  op: output
  input:
    op: source
    topic: events
    key: id
    schema: [ { name: id, type: Int64 } ]
"#;
        assert!(matches!(parse_yaml_plan(yaml), Err(DslError::Invalid(_))));
    }

    #[test]
    fn unknown_types_and_formats_are_rejected() {
        let bad_type = r#"
plan:
  op: output
  console: true
  input:
    op: source
    topic: events
    key: id
    schema: [ { name: id, type: Decimal } ]
"#;
        assert!(matches!(parse_yaml_plan(bad_type), Err(DslError::Invalid(_))));

        let bad_format = bad_type.replace("Decimal", "Int64").replace("key: id", "key: id\n    format: protobuf");
        assert!(matches!(parse_yaml_plan(&bad_format), Err(DslError::Invalid(_))));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(parse_yaml_plan("plan: ["), Err(DslError::Yaml(_))));
        assert!(matches!(
            parse_yaml_plan("plan: { op: window }"),
            Err(DslError::Yaml(_))
        ));
    }
}
