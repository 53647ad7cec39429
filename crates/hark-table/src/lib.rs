//! Sound propagation table for the Hark engine.
//!
//! For every ordered pair of leaves the [`PropagationTable`] answers
//! whether sound reaches directly, reaches only around corners, and for
//! the latter how far it travels and from which direction it arrives. The
//! [`TableBuilder`] fills the table from a [`LeafGraph`] using repeated
//! bidirectional searches; the result is immutable and cheap to query
//! from the audio thread.
//!
//! [`LeafGraph`]: hark_graph::LeafGraph

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod config;
pub mod error;
pub mod influx;
pub mod props;
pub mod table;

pub use builder::{resolve_pair, PairProps, TableBuild, TableBuilder, UNKNOWN_INFLUX};
pub use config::{TableBuildConfig, TableConfigError};
pub use error::TableError;
pub use influx::{chain_influx, InfluxAccumulator, MAX_INFLUX_CONTRIBUTIONS};
pub use props::PropagationProps;
pub use table::{IndirectPath, PropagationTable};
