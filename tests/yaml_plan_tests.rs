//! YAML plan DSL: parsing, config blocks and compile-through.

use streamc_compiler::{compile_plan, CompileError};
use streamc_core::config::CompilerConfig;
use streamc_core::dag::{DataSourceType, PlanNode};
use streamc_planner::{parse_yaml_plan, DslError};

const ENRICH_PLAN: &str = r#"
config:
  state_store_suffix: "-changelog"
  console_row_limit: 10
plan:
  op: output
  sink: "orders_enriched"
  input:
    op: project
    columns:
      - { expr: "o.order_id", alias: order_id }
      - { expr: "u.name", alias: customer }
      - { expr: "o.amount * 1.2", alias: gross }
    input:
      op: join
      type: left
      left_key: customer_id
      right_key: id
      left_alias: o
      right_alias: u
      left:
        op: filter
        predicate: "amount > 0 AND NOT (status = 'void')"
        input:
          op: source
          topic: orders
          key: order_id
          format: avro
          avro_schema: "orders-value"
          schema:
            - { name: order_id, type: Int64 }
            - { name: customer_id, type: Int64 }
            - { name: amount, type: Float64, nullable: true }
            - { name: status, type: Utf8, nullable: true }
      right:
        op: source
        topic: customers
        mode: table
        key: id
        schema:
          - { name: id, type: Int64 }
          - { name: name, type: Utf8, nullable: true }
"#;

#[test]
fn test_parse_enrichment_plan() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    assert_eq!(parsed.config.state_store_suffix.as_deref(), Some("-changelog"));
    assert_eq!(parsed.config.console_row_limit, Some(10));
    assert_eq!(parsed.config.max_plan_depth, None);
    assert_eq!(parsed.plan.node_count(), 6);
    assert_eq!(parsed.plan.depth(), 5);
    assert_eq!(
        parsed.plan.schema().names().collect::<Vec<_>>(),
        vec!["order_id", "customer", "gross"]
    );
}

#[test]
fn test_node_ids_follow_construction_order() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    // source(1) -> filter(2), source(3), join(4), project(5), output(6)
    assert_eq!(parsed.plan.id().get(), 6);
    let mut ids = Vec::new();
    collect_ids(&parsed.plan, &mut ids);
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
}

fn collect_ids(node: &PlanNode, out: &mut Vec<u64>) {
    out.push(node.id().get());
    for child in node.sources() {
        collect_ids(child, out);
    }
}

#[test]
fn test_compile_parsed_plan_with_config() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    let config = CompilerConfig {
        state_store_suffix: parsed.config.state_store_suffix.clone().unwrap(),
        ..CompilerConfig::default()
    };
    let compiled = compile_plan(&parsed.plan, &config).unwrap();
    let description = compiled.topology.describe();
    assert!(description.contains("customers as JSON into customers-changelog"));
    assert!(description.contains("orders_enriched as AVRO(orders-value)"));
    assert_eq!(compiled.topology.count_ops("select_key"), 1);
    assert_eq!(compiled.handle.key_field().name, "o.customer_id");
}

#[test]
fn test_explain_renders_tree() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    let text = parsed.plan.explain();
    let first = text.lines().next().unwrap();
    assert_eq!(first, "Output(sink) NodeId(6): topic=orders_enriched");
    assert!(text.contains("  Project NodeId(5):"));
    assert!(text.contains("        Source(stream) NodeId(1): topic=orders key=order_id"));
}

#[test]
fn test_stream_joined_to_stream_fails_at_compile_time() {
    let yaml = ENRICH_PLAN.replace("mode: table", "mode: stream");
    let parsed = parse_yaml_plan(&yaml).unwrap();
    let PlanNode::Output(out) = &parsed.plan else {
        panic!("expected output root");
    };
    let PlanNode::Project(p) = out.source.as_ref() else {
        panic!("expected project");
    };
    let PlanNode::Join(j) = p.source.as_ref() else {
        panic!("expected join");
    };
    let PlanNode::Source(right) = j.right.as_ref() else {
        panic!("expected source");
    };
    assert_eq!(right.source_type, DataSourceType::Stream);

    let err = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedJoin { .. }));
}

#[test]
fn test_inner_join_parses_but_does_not_compile() {
    let yaml = ENRICH_PLAN.replace("type: left", "type: inner");
    let parsed = parse_yaml_plan(&yaml).unwrap();
    let err = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap_err();
    assert!(err.to_string().contains("INNER"));
}

#[test]
fn test_schema_errors_surface_from_core() {
    let yaml = ENRICH_PLAN.replace("left_key: customer_id", "left_key: missing_col");
    assert!(matches!(parse_yaml_plan(&yaml), Err(DslError::Plan(_))));

    let yaml = ENRICH_PLAN.replace("amount > 0 AND", "amount + 0 +");
    assert!(matches!(parse_yaml_plan(&yaml), Err(DslError::Plan(_))));
}

#[test]
fn test_avro_without_schema_is_invalid() {
    let yaml = ENRICH_PLAN.replace("avro_schema: \"orders-value\"", "");
    assert!(matches!(parse_yaml_plan(&yaml), Err(DslError::Invalid(_))));
}

#[test]
fn test_parse_invalid_yaml() {
    assert!(parse_yaml_plan("plan: { op: [").is_err());
    assert!(parse_yaml_plan("steps: []").is_err());
}
