//! Deterministic replay & provenance helpers.
//!
//! A topology hash covers every stage, including predicates, projections and
//! serde descriptors. Two runs over the same topology and the same source
//! data produce the same sink rows in the same order.

use streamc_core::hash::Hash256;
use streamc_dataflow::Topology;

use crate::ExecError;

pub fn hash_topology(topology: &Topology) -> Result<Hash256, ExecError> {
    topology
        .fingerprint()
        .map_err(|e| ExecError::Hash(e.to_string()))
}

/// True when both topologies would execute identically.
pub fn same_topology(a: &Topology, b: &Topology) -> Result<bool, ExecError> {
    Ok(hash_topology(a)? == hash_topology(b)?)
}
