//! Cache file locations.

use std::path::{Path, PathBuf};

/// Directory under the cache root holding propagation files.
pub const CACHE_SUBDIR: &str = "sounds/propagation";
/// Extension of graph files.
pub const GRAPH_EXTENSION: &str = "hkgraph1";
/// Extension of table files.
pub const TABLE_EXTENSION: &str = "hktable1";

/// Name used when cleaning leaves nothing.
const EMPTY_NAME: &str = "unnamed";

/// Reduce a map name to a safe file stem.
///
/// Any directory and the last extension are stripped, the rest is
/// lowercased, and every character outside `[a-z0-9_-]` becomes `_`.
pub fn clean_map_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    let cleaned: String = stem
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect();
    if cleaned.is_empty() {
        EMPTY_NAME.to_string()
    } else {
        cleaned
    }
}

/// Resolves cache file paths below a root directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    /// Paths below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all propagation files.
    pub fn dir(&self) -> PathBuf {
        self.root.join(CACHE_SUBDIR)
    }

    /// Graph file for `map_name`.
    pub fn graph_file(&self, map_name: &str) -> PathBuf {
        self.file(map_name, GRAPH_EXTENSION)
    }

    /// Table file for `map_name`.
    pub fn table_file(&self, map_name: &str) -> PathBuf {
        self.file(map_name, TABLE_EXTENSION)
    }

    fn file(&self, map_name: &str, extension: &str) -> PathBuf {
        self.dir()
            .join(format!("{}.{extension}", clean_map_name(map_name)))
    }
}

/// Sibling path a file is written to before being renamed into place.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
