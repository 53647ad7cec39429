//! Graph construction parameters.

use std::error::Error;
use std::fmt;

// ── GraphConfigError ───────────────────────────────────────────────

/// Errors detected during [`GraphBuildConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphConfigError {
    /// `samples_per_pair` is above [`MAX_SAMPLES_PER_PAIR`].
    TooManySamples {
        /// The configured count.
        configured: usize,
    },
    /// `large_map_samples` is above `samples_per_pair`.
    LargeMapSamplesExceedBase {
        /// The configured large-map count.
        large_map_samples: usize,
        /// The configured base count.
        samples_per_pair: usize,
    },
    /// `task_count` is `Some(0)`.
    ZeroTasks,
}

impl fmt::Display for GraphConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManySamples { configured } => {
                write!(f, "samples_per_pair {configured} exceeds {MAX_SAMPLES_PER_PAIR}")
            }
            Self::LargeMapSamplesExceedBase {
                large_map_samples,
                samples_per_pair,
            } => write!(
                f,
                "large_map_samples {large_map_samples} exceeds samples_per_pair {samples_per_pair}"
            ),
            Self::ZeroTasks => write!(f, "task_count must be at least 1"),
        }
    }
}

impl Error for GraphConfigError {}

// ── GraphBuildConfig ───────────────────────────────────────────────

/// Configuration for [`GraphBuilder`](crate::GraphBuilder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphBuildConfig {
    /// Random point-to-point raycasts per leaf pair, on top of the
    /// center-to-center ray.
    pub samples_per_pair: usize,
    /// Leaf count above which `large_map_samples` is used instead.
    pub large_map_threshold: usize,
    /// Random raycasts per pair on large maps.
    pub large_map_samples: usize,
    /// Base seed for the per-row sample generators.
    pub seed: u64,
    /// Number of parallel tasks. `None` uses the hardware parallelism.
    pub task_count: Option<usize>,
}

/// Upper bound on random samples per pair.
pub const MAX_SAMPLES_PER_PAIR: usize = 64;

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            samples_per_pair: 8,
            large_map_threshold: 8192,
            large_map_samples: 3,
            seed: 0x6861_726b,
            task_count: None,
        }
    }
}

impl GraphBuildConfig {
    /// Random raycasts per pair for a map of `num_leafs` leaves.
    pub fn samples_for(&self, num_leafs: usize) -> usize {
        if num_leafs > self.large_map_threshold {
            self.large_map_samples
        } else {
            self.samples_per_pair
        }
    }

    /// Check the configuration, returning the first violated constraint.
    pub fn validate(&self) -> Result<(), GraphConfigError> {
        if self.samples_per_pair > MAX_SAMPLES_PER_PAIR {
            return Err(GraphConfigError::TooManySamples {
                configured: self.samples_per_pair,
            });
        }
        if self.large_map_samples > self.samples_per_pair {
            return Err(GraphConfigError::LargeMapSamplesExceedBase {
                large_map_samples: self.large_map_samples,
                samples_per_pair: self.samples_per_pair,
            });
        }
        if self.task_count == Some(0) {
            return Err(GraphConfigError::ZeroTasks);
        }
        Ok(())
    }
}
