#![forbid(unsafe_code)]
//! streamc-dataflow: the capabilities the compiler builds against.
//!
//! Design intent:
//! - `DataflowBuilder` is the factory surface of an execution runtime
//!   (create keyed streams/tables, derive filter/project/rekey/join stages,
//!   attach terminal writes). The compiler only ever sees opaque `StageId`s.
//! - `SerdeRegistry` maps a `CodecDescriptor` to a concrete row serde.
//! - `TopologyBuilder` is the in-tree implementation: it records every stage
//!   into a serializable `Topology` that tests, the CLI and the reference
//!   runner consume.

pub mod error;
pub mod serde_registry;
pub mod stage;
pub mod topology;
pub mod traits;

pub use error::{DataflowError, Result};
pub use serde_registry::{DefaultSerdeRegistry, KeyFormat, RowSerde};
pub use stage::{Stage, StageKind, StageOp};
pub use topology::{Topology, TopologyBuilder};
pub use traits::{DataflowBuilder, SerdeRegistry};
