//! On-disk cache for Hark propagation artifacts.
//!
//! Building a [`LeafGraph`] and [`PropagationTable`] for a large map takes
//! long enough that both are saved next to the game data and reused while
//! the map is unchanged. Each map gets two files below
//! `<root>/sounds/propagation/`, named after the cleaned map name:
//! `.hkgraph1` for the graph and `.hktable1` for the table. Both start
//! with the map checksum and leaf count; a file for a different map, or
//! one that fails structural validation, is rejected as a whole.
//!
//! [`LeafGraph`]: hark_graph::LeafGraph
//! [`PropagationTable`]: hark_table::PropagationTable

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod graph_file;
pub mod paths;
pub mod store;
pub mod table_file;

pub use error::CacheError;
pub use graph_file::{read_graph, write_graph};
pub use paths::{clean_map_name, CachePaths, GRAPH_EXTENSION, TABLE_EXTENSION};
pub use store::CacheStore;
pub use table_file::{read_table, write_table};
