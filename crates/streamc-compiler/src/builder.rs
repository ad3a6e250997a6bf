//! `PhysicalPlanBuilder`: single recursive pass from plan nodes to stages.
//!
//! Children are always compiled before their parent, so every stage the
//! builder asks for has inputs that already exist. Compiler state that lives
//! for one compilation (the recorded sink, the root handle) is reset at the
//! start of each `build_physical_plan` call.

use streamc_core::config::CompilerConfig;
use streamc_core::dag::{
    DataSourceType, FilterNode, JoinNode, JoinType, OutputNode, OutputTarget, PlanNode,
    ProjectNode, SourceNode,
};
use streamc_core::schema::Field;
use streamc_dataflow::{
    DataflowBuilder, DefaultSerdeRegistry, SerdeRegistry, Topology, TopologyBuilder,
};

use crate::codec::resolve_codec;
use crate::error::{CompileError, Result};
use crate::handle::PhysicalHandle;

#[derive(Debug, Default)]
struct CompileContext {
    sink: Option<OutputNode>,
    root: Option<PhysicalHandle>,
}

pub struct PhysicalPlanBuilder<B, R> {
    dataflow: B,
    serdes: R,
    config: CompilerConfig,
    ctx: CompileContext,
}

impl<B: DataflowBuilder, R: SerdeRegistry> PhysicalPlanBuilder<B, R> {
    pub fn new(dataflow: B, serdes: R, config: CompilerConfig) -> Self {
        Self {
            dataflow,
            serdes,
            config,
            ctx: CompileContext::default(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Sink recorded by the last successful compilation.
    pub fn plan_sink(&self) -> Option<&OutputNode> {
        self.ctx.sink.as_ref()
    }

    /// Root handle of the last successful compilation.
    pub fn root_handle(&self) -> Option<&PhysicalHandle> {
        self.ctx.root.as_ref()
    }

    pub fn dataflow(&self) -> &B {
        &self.dataflow
    }

    /// Give back the dataflow builder, e.g. to finish a `TopologyBuilder`.
    pub fn into_builder(self) -> B {
        self.dataflow
    }

    /// Compile `root`, which must be an `Output` node.
    pub fn build_physical_plan(&mut self, root: &PlanNode) -> Result<PhysicalHandle> {
        self.ctx = CompileContext::default();

        let PlanNode::Output(_) = root else {
            return Err(CompileError::InvalidRoot {
                id: root.id(),
                kind: root.kind_name(),
            });
        };

        let handle = self.compile(root, 1)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            root = %root.id(),
            stage = handle.stage().get(),
            kind = %handle.kind(),
            key = %handle.key_field().name,
            "plan compiled"
        );

        self.ctx.root = Some(handle.clone());
        Ok(handle)
    }

    fn compile(&mut self, node: &PlanNode, depth: usize) -> Result<PhysicalHandle> {
        if depth > self.config.max_plan_depth {
            return Err(CompileError::PlanTooDeep {
                id: node.id(),
                limit: self.config.max_plan_depth,
            });
        }
        match node {
            PlanNode::Source(n) => self.source(n),
            PlanNode::Filter(n) => self.filter(n, depth),
            PlanNode::Project(n) => self.project(n, depth),
            PlanNode::Join(n) => self.join(n, depth),
            PlanNode::Output(n) if depth == 1 => self.output(n, depth),
            PlanNode::Output(_) => Err(CompileError::UnsupportedNode {
                id: node.id(),
                kind: node.kind_name(),
            }),
        }
    }

    fn source(&mut self, node: &SourceNode) -> Result<PhysicalHandle> {
        let serde = self.serdes.row_serde(&node.codec)?;
        let key = &node.key_field;
        Ok(match node.source_type {
            DataSourceType::Stream => {
                let stage = self
                    .dataflow
                    .stream(&node.topic, serde, &node.schema, &key.name)?;
                PhysicalHandle::stream(node.schema.clone(), key.clone(), stage)
            }
            DataSourceType::Table => {
                let store = self.config.state_store_name(&node.topic);
                let stage =
                    self.dataflow
                        .table(&node.topic, serde, &store, &node.schema, &key.name)?;
                PhysicalHandle::table(node.schema.clone(), key.clone(), stage)
            }
        })
    }

    fn filter(&mut self, node: &FilterNode, depth: usize) -> Result<PhysicalHandle> {
        let input = self.compile(&node.source, depth + 1)?;
        Ok(input.filter(&mut self.dataflow, &node.predicate)?)
    }

    fn project(&mut self, node: &ProjectNode, depth: usize) -> Result<PhysicalHandle> {
        let input = self.compile(&node.source, depth + 1)?;
        let key = node
            .schema
            .field_by_name(&input.key_field().name)
            .unwrap_or_else(|| input.key_field())
            .clone();
        Ok(input.project(&mut self.dataflow, &node.expressions, &node.schema, key)?)
    }

    fn join(&mut self, node: &JoinNode, depth: usize) -> Result<PhysicalHandle> {
        let mut left = self.compile(&node.left, depth + 1)?;
        let right = self.compile(&node.right, depth + 1)?;

        if !right.is_table() {
            return Err(CompileError::UnsupportedJoin {
                id: node.id,
                left: left.kind(),
                right: right.kind(),
            });
        }

        let left_key = lookup(&left, &node.left_key_field_name, node)?;
        if !left.key_field().name_matches(&left_key.name) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                join = %node.id,
                from = %left.key_field().name,
                to = %left_key.name,
                "rekeying left join input"
            );
            left = left.select_key(&mut self.dataflow, left_key.clone())?;
        }
        lookup(&right, &node.right_key_field_name, node)?;

        match node.join_type {
            JoinType::Left => {
                let qualified = format!("{}.{}", node.left_alias, left_key.name);
                let key = node.schema.field_by_name(&qualified).cloned().ok_or_else(|| {
                    CompileError::MissingField {
                        id: node.id,
                        field: qualified.clone(),
                    }
                })?;
                let serde = self.serdes.row_serde(resolve_codec(&node.left))?;
                Ok(left.left_join(&mut self.dataflow, &right, &node.schema, key, serde)?)
            }
            kind @ (JoinType::Inner | JoinType::Outer) => Err(CompileError::UnsupportedJoinKind {
                id: node.id,
                kind,
            }),
        }
    }

    fn output(&mut self, node: &OutputNode, depth: usize) -> Result<PhysicalHandle> {
        let input = self.compile(&node.source, depth + 1)?;
        let handle = match &node.target {
            OutputTarget::Topic { name } => {
                if name.trim().is_empty() {
                    return Err(CompileError::UnsupportedOutput {
                        id: node.id,
                        reason: "sink destination name is blank".into(),
                    });
                }
                let serde = self.serdes.row_serde(resolve_codec(&node.source))?;
                input.to_topic(&mut self.dataflow, name, serde)?
            }
            OutputTarget::Console => input.print(&mut self.dataflow)?,
        };
        self.record_sink(node);
        Ok(handle)
    }

    fn record_sink(&mut self, node: &OutputNode) {
        debug_assert!(self.ctx.sink.is_none(), "sink recorded twice");
        self.ctx.sink = Some(node.clone());
    }
}

fn lookup(handle: &PhysicalHandle, name: &str, node: &JoinNode) -> Result<Field> {
    handle
        .schema()
        .field_by_name(name)
        .cloned()
        .ok_or_else(|| CompileError::MissingField {
            id: node.id,
            field: name.to_string(),
        })
}

/// Everything a caller needs after compiling with the in-tree builder.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub handle: PhysicalHandle,
    pub sink: OutputNode,
    pub topology: Topology,
}

/// Compile `root` into a recorded `Topology` using the default registry.
pub fn compile_plan(root: &PlanNode, config: &CompilerConfig) -> Result<CompiledPlan> {
    let mut compiler =
        PhysicalPlanBuilder::new(TopologyBuilder::new(), DefaultSerdeRegistry::new(), config.clone());
    let handle = compiler.build_physical_plan(root)?;
    let sink = compiler
        .plan_sink()
        .cloned()
        .ok_or_else(|| CompileError::InvalidRoot {
            id: root.id(),
            kind: root.kind_name(),
        })?;
    Ok(CompiledPlan {
        handle,
        sink,
        topology: compiler.into_builder().finish(),
    })
}
