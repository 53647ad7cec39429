//! Shared and task-private buffers for Hark table construction.
//!
//! Graph tables are large (`N²` entries) and are shared read-only by every
//! builder task and every precision-specialised copy of a graph. Search
//! state, by contrast, is private to one task and reset thousands of times
//! per build.
//!
//! # Architecture
//!
//! ```text
//! SharedBuffer<T>   Arc<[T]>: immutable, reference-counted table storage
//! StampedSlots<T>   task-private scratch, O(1) reset via generation stamps
//! try_vec()         fallible allocation reporting ArenaError
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod error;
pub mod scratch;
pub mod shared;

pub use alloc::try_vec;
pub use error::ArenaError;
pub use scratch::StampedSlots;
pub use shared::SharedBuffer;
