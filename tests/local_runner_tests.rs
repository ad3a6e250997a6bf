//! Reference runner end to end: YAML plan + JSON input -> sink rows.

use serde_json::json;
use streamc_compiler::compile_plan;
use streamc_core::config::CompilerConfig;
use streamc_exec::replay::{hash_topology, same_topology};
use streamc_exec::{LocalRunner, SourceData};
use streamc_planner::parse_yaml_plan;

const ENRICH_PLAN: &str = r#"
plan:
  op: output
  sink: enriched
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
        - { name: amount, type: Float64, nullable: true }
    right:
      op: source
      topic: users
      mode: table
      key: id
      schema:
        - { name: id, type: Int64 }
        - { name: name, type: Utf8, nullable: true }
"#;

fn input() -> serde_json::Value {
    json!({
        "orders": [
            { "order_id": 1, "user_id": 10, "amount": 9.5 },
            { "order_id": 2, "user_id": 11, "amount": null },
            { "order_id": 3, "user_id": 10, "amount": 20.0 }
        ],
        "users": [
            { "id": 10, "name": "ada" },
            { "id": 10, "name": "ada lovelace" },
            { "id": 12, "name": "grace" }
        ]
    })
}

#[test]
fn test_left_join_end_to_end() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    let compiled = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    let data = SourceData::from_json(&input(), &compiled.topology).unwrap();

    let out = LocalRunner::default().run(&compiled.topology, &data).unwrap();
    let rows: Vec<String> = out
        .rows_for("enriched")
        .iter()
        .map(|r| r.to_string())
        .collect();
    assert_eq!(
        rows,
        vec![
            "10 | 1, 10, 9.5, 10, ada lovelace",
            "11 | 2, 11, null, null, null",
            "10 | 3, 10, 20, 10, ada lovelace",
        ]
    );
    assert_eq!(out.manifest.rows_in, 6);
    assert_eq!(out.manifest.rows_out, 3);
    assert!(out.console.is_empty());
}

#[test]
fn test_filter_emits_at_most_input_rows_and_project_preserves_count() {
    let yaml = r#"
plan:
  op: output
  console: true
  input:
    op: project
    columns:
      - { expr: id }
      - { expr: "score >= 50", alias: passed }
    input:
      op: filter
      predicate: "score IS NOT NULL"
      input:
        op: source
        topic: results
        key: id
        schema:
          - { name: id, type: Int64 }
          - { name: score, type: Int32, nullable: true }
"#;
    let parsed = parse_yaml_plan(yaml).unwrap();
    let compiled = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    let data = SourceData::from_json(
        &json!({ "results": [
            { "id": 1, "score": 70 },
            { "id": 2, "score": null },
            { "id": 3, "score": 20 }
        ]}),
        &compiled.topology,
    )
    .unwrap();
    let out = LocalRunner::default().run(&compiled.topology, &data).unwrap();
    assert_eq!(out.console, vec!["1 | 1, true", "3 | 3, false"]);
    assert!(out.console.len() <= 3);
}

#[test]
fn test_table_projection_preserves_row_count_when_key_is_dropped() {
    let yaml = r#"
plan:
  op: output
  sink: names
  input:
    op: project
    columns:
      - { expr: name }
    input:
      op: source
      topic: users
      mode: table
      key: id
      schema:
        - { name: id, type: Int64 }
        - { name: name, type: Utf8, nullable: true }
"#;
    let parsed = parse_yaml_plan(yaml).unwrap();
    let compiled = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    assert!(compiled.handle.is_table());
    assert_eq!(compiled.handle.key_field().name, "id");

    let data = SourceData::from_json(
        &json!({ "users": [
            { "id": 1, "name": "ada" },
            { "id": 2, "name": "ada" },
            { "id": 3, "name": "bob" }
        ]}),
        &compiled.topology,
    )
    .unwrap();
    let out = LocalRunner::default().run(&compiled.topology, &data).unwrap();
    let rows: Vec<String> = out.rows_for("names").iter().map(|r| r.to_string()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows, vec!["1 | ada", "2 | ada", "3 | bob"]);
}

#[test]
fn test_runs_are_reproducible() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    let a = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    let b = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    assert!(same_topology(&a.topology, &b.topology).unwrap());

    let data = SourceData::from_json(&input(), &a.topology).unwrap();
    let runner = LocalRunner::default();
    let first = runner.run(&a.topology, &data).unwrap();
    let second = runner.run(&b.topology, &data).unwrap();
    assert_eq!(first.sink_rows, second.sink_rows);
    assert_eq!(first.manifest.topology_hash, second.manifest.topology_hash);
    assert_ne!(first.manifest.id, second.manifest.id);
    assert_eq!(
        first.manifest.topology_hash,
        hash_topology(&a.topology).unwrap()
    );
}

#[test]
fn test_console_limit_comes_from_config() {
    let yaml = r#"
plan:
  op: output
  console: true
  input:
    op: source
    topic: ticks
    key: n
    schema: [ { name: n, type: Int64 } ]
"#;
    let parsed = parse_yaml_plan(yaml).unwrap();
    let config = CompilerConfig {
        console_row_limit: Some(1),
        ..CompilerConfig::default()
    };
    let compiled = compile_plan(&parsed.plan, &config).unwrap();
    let data = SourceData::from_json(
        &json!({ "ticks": [ { "n": 1 }, { "n": 2 } ] }),
        &compiled.topology,
    )
    .unwrap();
    let out = LocalRunner::new(&config).run(&compiled.topology, &data).unwrap();
    assert_eq!(out.console, vec!["1 | 1"]);
}

#[test]
fn test_missing_topics_read_as_empty() {
    let parsed = parse_yaml_plan(ENRICH_PLAN).unwrap();
    let compiled = compile_plan(&parsed.plan, &CompilerConfig::default()).unwrap();
    let data = SourceData::from_json(&json!({}), &compiled.topology).unwrap();
    let out = LocalRunner::default().run(&compiled.topology, &data).unwrap();
    assert!(out.rows_for("enriched").is_empty());
    assert_eq!(out.manifest.rows_in, 0);
}
