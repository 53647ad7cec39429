//! Load-or-build orchestration for Hark propagation data.
//!
//! [`PropagationEngine`] owns the [`LeafGraph`] and [`PropagationTable`] of
//! the current map. [`PropagationEngine::ensure_valid`] is called after a
//! map load: it returns at once if the data already matches the map's
//! [`CacheKey`], and otherwise loads each artifact from the disk cache or
//! builds and saves it. Nothing it does can fail the caller; a map that
//! cannot be processed gets placeholder data that answers "no path".
//!
//! [`LeafGraph`]: hark_graph::LeafGraph
//! [`PropagationTable`]: hark_table::PropagationTable
//! [`CacheKey`]: hark_core::CacheKey

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod metrics;

pub use config::{CacheMode, ConfigError, EngineConfig};
pub use engine::PropagationEngine;
pub use metrics::{ArtifactSource, BuildMetrics};
