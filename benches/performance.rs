use criterion::{criterion_group, criterion_main, Criterion};
use streamc_compiler::compile_plan;
use streamc_core::prelude::*;
use streamc_planner::PlanBuilder;

fn wide_schema(prefix: &str, width: usize) -> Schema {
    let mut fields = vec![Field::new("id", DataType::Int64, false)];
    for i in 0..width {
        fields.push(Field::new(format!("{}_{}", prefix, i), DataType::Float64, true));
    }
    Schema::new(fields)
}

/// A chain of `depth` left joins, each against its own table, over a wide stream.
fn join_chain(depth: usize, width: usize) -> PlanNode {
    let mut b = PlanBuilder::new();
    let mut plan = b
        .stream("facts", wide_schema("f", width), "id", CodecDescriptor::Json)
        .unwrap();
    let mut key = "id".to_string();
    for level in 0..depth {
        let dim = b
            .table(
                &format!("dim_{}", level),
                wide_schema("d", width),
                "id",
                CodecDescriptor::Json,
            )
            .unwrap();
        let alias = format!("l{}", level);
        plan = b
            .join(JoinType::Left, plan, dim, &key, "id", &alias, "d")
            .unwrap();
        key = format!("{}.{}", alias, key);
    }
    let filtered = b.filter(plan, &format!("{} > 0", key)).unwrap();
    b.to_topic(filtered, "out")
}

fn bench_compile_join_chain(c: &mut Criterion) {
    let plan = join_chain(8, 32);
    let config = CompilerConfig::default();
    c.bench_function("compile_join_chain", |b| {
        b.iter(|| {
            let _ = compile_plan(&plan, &config).unwrap();
        })
    });
}

criterion_group!(compiler, bench_compile_join_chain);
criterion_main!(compiler);
