//! Metrics of the most recent load-or-build pass.
//!
//! [`BuildMetrics`] is filled by
//! [`PropagationEngine::ensure_valid`](crate::PropagationEngine::ensure_valid)
//! and kept until the next pass that does work.

/// Where an artifact came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Nothing was produced yet.
    #[default]
    None,
    /// Already valid in memory; nothing was done.
    Memory,
    /// Loaded from a cache file.
    Cache,
    /// Computed by a builder.
    Built,
    /// A placeholder installed after a failure.
    Degraded,
}

/// Timing and outcome data for one pass.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct BuildMetrics {
    /// Leaf count of the map.
    pub num_leafs: usize,
    /// Origin of the leaf graph.
    pub graph_source: ArtifactSource,
    /// Origin of the propagation table.
    pub table_source: ArtifactSource,
    /// Time spent loading or building the graph.
    pub graph_us: u64,
    /// Time spent loading or building the table.
    pub table_us: u64,
    /// Wall-clock time of the whole pass.
    pub total_us: u64,
    /// Parallel tasks used by the graph builder.
    pub graph_tasks: usize,
    /// Parallel tasks used by the table builder.
    pub table_tasks: usize,
    /// Leaf pairs sampled by the graph builder.
    pub graph_pairs: u64,
    /// Path searches run by the table builder.
    pub table_searches: u64,
    /// Ordered leaf pairs with a direct path.
    pub direct_pairs: usize,
    /// Ordered leaf pairs with an indirect path.
    pub indirect_pairs: usize,
    /// Cache files that existed but were rejected.
    pub rejected_files: u32,
    /// Cache files that could not be written.
    pub save_failures: u32,
    /// Memory held by the graph and table, in bytes.
    pub memory_bytes: usize,
}

impl BuildMetrics {
    /// Whether either artifact is a placeholder.
    pub fn is_degraded(&self) -> bool {
        self.graph_source == ArtifactSource::Degraded
            || self.table_source == ArtifactSource::Degraded
    }
}
