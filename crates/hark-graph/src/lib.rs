//! Leaf adjacency graph for the Hark sound-propagation engine.
//!
//! A [`LeafGraph`] records, for every pair of map leaves, whether sound can
//! travel between them directly (a clear raycast exists) together with the
//! center-to-center distance and the averaged travel direction. The
//! [`GraphBuilder`] samples these edges from a [`SpatialQuery`] in
//! parallel; the [`PathFinder`] runs bidirectional Dijkstra searches over a
//! [`WeightedView`] of the graph when the propagation table is built.
//!
//! [`SpatialQuery`]: hark_core::SpatialQuery

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod pathfinder;
pub mod view;

pub use builder::{Edge, GraphBuild, GraphBuilder};
pub use config::{GraphBuildConfig, GraphConfigError};
pub use error::GraphError;
pub use graph::LeafGraph;
pub use pathfinder::{PathChain, PathFinder, PathResult};
pub use view::WeightedView;
