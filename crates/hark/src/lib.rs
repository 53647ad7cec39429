//! Hark: precomputed sound propagation for leaf-partitioned maps.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Hark sub-crates. For most users, adding `hark` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use hark::prelude::*;
//!
//! // Two unit boxes side by side with nothing in between.
//! struct TwoBoxes;
//! impl SpatialQuery for TwoBoxes {
//!     fn num_leafs(&self) -> usize { 3 }
//!     fn leaf_bounds(&self, leaf: LeafId) -> Aabb {
//!         let x = leaf.0 as f32;
//!         Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
//!     }
//!     fn point_leaf(&self, p: Vec3) -> LeafId {
//!         match p.x {
//!             x if (1.0..2.0).contains(&x) => LeafId(1),
//!             x if (2.0..3.0).contains(&x) => LeafId(2),
//!             _ => LeafId::INVALID,
//!         }
//!     }
//!     fn leafs_in_pvs(&self, _: LeafId, _: LeafId) -> bool { true }
//!     fn trace_solid(&self, _: Vec3, to: Vec3) -> TraceResult { TraceResult::clear(to) }
//! }
//!
//! let mut engine = PropagationEngine::new(EngineConfig::default().with_task_count(2)).unwrap();
//! let source = engine.ensure_valid(Arc::new(TwoBoxes), &MapIdentity::new("boxes", 0));
//! assert_eq!(source, ArtifactSource::Built);
//! assert!(engine.has_direct_path(LeafId(1), LeafId(2)));
//! assert!(engine.indirect_path_props(LeafId(1), LeafId(2)).is_none());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hark-core` | Leaf ids, vectors, the spatial boundary, map identity |
//! | [`arena`] | `hark-arena` | Shared buffers, stamped scratch, fallible allocation |
//! | [`exec`] | `hark-exec` | Fork/join host, workload partitioning, progress |
//! | [`graph`] | `hark-graph` | Leaf graph, its builder, bidirectional search |
//! | [`table`] | `hark-table` | Propagation properties, table and builder |
//! | [`cache`] | `hark-cache` | Cache file formats and store |
//! | [`engine`] | `hark-engine` | Load-or-build orchestration and queries |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`hark-core`).
///
/// Implement [`types::SpatialQuery`] over your map to feed the builders.
pub use hark_core as types;

/// Shared and scratch storage (`hark-arena`).
pub use hark_arena as arena;

/// Fork/join execution (`hark-exec`).
///
/// [`exec::ParallelHost`] runs the first task on the calling thread and
/// the rest on named worker threads.
pub use hark_exec as exec;

/// Leaf graph construction and search (`hark-graph`).
pub use hark_graph as graph;

/// Propagation table construction and queries (`hark-table`).
pub use hark_table as table;

/// Cache files (`hark-cache`).
///
/// [`cache::CacheStore`] reads and writes `.hkgraph1` and `.hktable1`
/// files below a cache root.
pub use hark_cache as cache;

/// Load-or-build orchestration (`hark-engine`).
pub use hark_engine as engine;

/// Common imports for typical Hark usage.
///
/// ```rust
/// use hark::prelude::*;
/// ```
///
/// This imports the engine, its configuration, the spatial boundary trait
/// and the types needed to implement it and read query results.
pub mod prelude {
    // Core types and traits
    pub use hark_core::{Aabb, CacheKey, LeafId, MapIdentity, SpatialQuery, TraceResult, Vec3};

    // Errors
    pub use hark_cache::CacheError;
    pub use hark_core::BuildError;
    pub use hark_engine::ConfigError;

    // Builders
    pub use hark_graph::{GraphBuildConfig, LeafGraph};
    pub use hark_table::{IndirectPath, PropagationProps, PropagationTable, TableBuildConfig};

    // Engine
    pub use hark_engine::{ArtifactSource, BuildMetrics, CacheMode, EngineConfig, PropagationEngine};
}
