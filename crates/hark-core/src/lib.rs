//! Core types and traits for the Hark sound-propagation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Hark workspace:
//! leaf identifiers, vector math, numeric precision traits, map identity,
//! the [`SpatialQuery`] boundary to the collision system, and the shared
//! build error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod map;
pub mod math;
pub mod precision;
pub mod spatial;

pub use error::BuildError;
pub use id::LeafId;
pub use map::{map_checksum, CacheKey, MapIdentity};
pub use math::{Aabb, Vec3};
pub use precision::{GraphIndex, GraphScalar};
pub use spatial::{SpatialQuery, TraceResult};
