//! Run manifest emitted by the reference runner for audit/replay.
//!
//! Two runs over the same topology and inputs produce manifests with the same
//! `topology_hash` and row counts; only `id` and timestamps differ.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the topology that was executed.
    pub topology_hash: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Records read from all sources.
    pub rows_in: u64,

    /// Records delivered to the plan sink.
    pub rows_out: u64,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(topology_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            topology_hash,
            engine_version: crate::VERSION.to_string(),
            rows_in: 0,
            rows_out: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, rows_in: u64, rows_out: u64) -> Self {
        self.finished_ms = finished_ms;
        self.rows_in = rows_in;
        self.rows_out = rows_out;
        self
    }

    /// Wall-clock run time; zero if the clock stepped backwards.
    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
