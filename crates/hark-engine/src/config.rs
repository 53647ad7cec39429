//! Engine configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use hark_graph::{GraphBuildConfig, GraphConfigError};
use hark_table::{TableBuildConfig, TableConfigError};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EngineConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The graph build configuration is invalid.
    Graph(GraphConfigError),
    /// The table build configuration is invalid.
    Table(TableConfigError),
    /// The task count override is zero.
    ZeroTasks,
    /// The cache root is an empty path.
    EmptyCacheRoot,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(e) => write!(f, "invalid graph config: {e}"),
            Self::Table(e) => write!(f, "invalid table config: {e}"),
            Self::ZeroTasks => write!(f, "task_count must be at least 1"),
            Self::EmptyCacheRoot => write!(f, "cache_root must not be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            Self::Table(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphConfigError> for ConfigError {
    fn from(e: GraphConfigError) -> Self {
        Self::Graph(e)
    }
}

impl From<TableConfigError> for ConfigError {
    fn from(e: TableConfigError) -> Self {
        Self::Table(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Configuration for a [`PropagationEngine`](crate::PropagationEngine).
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    /// Root below which `sounds/propagation/` holds cache files. `None`
    /// disables the disk cache.
    pub cache_root: Option<PathBuf>,
    /// How the disk cache is used. Default: read and write.
    pub cache_mode: CacheMode,
    /// Graph sampling parameters.
    pub graph: GraphBuildConfig,
    /// Table construction parameters.
    pub table: TableBuildConfig,
    /// Parallel task count for both builders, overriding theirs.
    pub task_count: Option<usize>,
}

/// Which directions the disk cache is used in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Load existing files and save fresh builds.
    #[default]
    ReadWrite,
    /// Ignore existing files but save fresh builds.
    WriteOnly,
    /// Load existing files, never write.
    ReadOnly,
}

impl CacheMode {
    /// Whether files are loaded.
    pub fn reads(self) -> bool {
        matches!(self, Self::ReadWrite | Self::ReadOnly)
    }

    /// Whether fresh builds are saved.
    pub fn writes(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

impl EngineConfig {
    /// Use the disk cache below `root`.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(root.into());
        self
    }

    /// Build in memory only.
    pub fn without_cache(mut self) -> Self {
        self.cache_root = None;
        self
    }

    /// Set the cache mode.
    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Use `tasks` parallel tasks in both builders.
    pub fn with_task_count(mut self, tasks: usize) -> Self {
        self.task_count = Some(tasks);
        self
    }

    /// Replace the graph build configuration.
    pub fn with_graph_config(mut self, graph: GraphBuildConfig) -> Self {
        self.graph = graph;
        self
    }

    /// Replace the table build configuration.
    pub fn with_table_config(mut self, table: TableBuildConfig) -> Self {
        self.table = table;
        self
    }

    /// Graph configuration with the task override applied.
    pub fn effective_graph(&self) -> GraphBuildConfig {
        GraphBuildConfig {
            task_count: self.task_count.or(self.graph.task_count),
            ..self.graph.clone()
        }
    }

    /// Table configuration with the task override applied.
    pub fn effective_table(&self) -> TableBuildConfig {
        TableBuildConfig {
            task_count: self.task_count.or(self.table.task_count),
            ..self.table.clone()
        }
    }

    /// Validate all sub-configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.task_count == Some(0) {
            return Err(ConfigError::ZeroTasks);
        }
        if self
            .cache_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyCacheRoot);
        }
        self.effective_graph().validate()?;
        self.effective_table().validate()?;
        Ok(())
    }
}
