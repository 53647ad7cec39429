//! One-shot fork/join task execution for Hark table construction.
//!
//! Graph and table builds split their `O(N²)` pair work into contiguous
//! leaf ranges of equal workload and run one task per range. This crate
//! provides the pieces:
//!
//! - [`ParallelHost`]: registers tasks, runs the first on the calling
//!   thread and the rest on dedicated worker threads, joins them all
//! - [`partition_triangular`]: splits leaf rows into equal-workload ranges
//! - [`ProgressCounter`]: contention-bounded progress reporting
//! - [`run_partitioned`]: the three combined, recovering rejected tasks
//!
//! Workers exist only for the duration of one [`ParallelHost::exec`]; there
//! is no long-lived pool.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod host;
pub mod partition;
pub mod progress;

pub use error::ExecError;
pub use host::{run_partitioned, run_partitioned_on, ParallelHost, Spawner, WorkerBody};
pub use partition::{pair_workload, partition_triangular};
pub use progress::{ProgressCounter, ProgressReporter};
