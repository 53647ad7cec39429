//! Loading and saving cache files on disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use hark_core::CacheKey;
use hark_graph::LeafGraph;
use hark_table::PropagationTable;

use crate::error::CacheError;
use crate::graph_file::{read_graph, write_graph};
use crate::paths::{temp_sibling, CachePaths};
use crate::table_file::{read_table, write_table};

/// Graph and table files of every map below one cache root.
#[derive(Clone, Debug)]
pub struct CacheStore {
    paths: CachePaths,
}

impl CacheStore {
    /// Store rooted at `root`. Nothing is created until the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: CachePaths::new(root),
        }
    }

    /// File locations.
    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    /// Load the graph stored for `key`.
    pub fn load_graph(&self, key: &CacheKey) -> Result<LeafGraph<f32, u32>, CacheError> {
        let path = self.paths.graph_file(&key.map_name);
        let mut reader = BufReader::new(File::open(&path)?);
        let graph = read_graph(&mut reader, key.checksum, key.num_leafs)?;
        tracing::info!(path = %path.display(), num_leafs = key.num_leafs, "loaded leaf graph");
        Ok(graph)
    }

    /// Save `graph` for `key`, returning the file written.
    pub fn save_graph(&self, key: &CacheKey, graph: &LeafGraph<f32, u32>) -> Result<PathBuf, CacheError> {
        let path = self.paths.graph_file(&key.map_name);
        write_atomically(&path, |w| write_graph(w, key.checksum, graph))?;
        tracing::info!(path = %path.display(), "saved leaf graph");
        Ok(path)
    }

    /// Load the table stored for `key`.
    pub fn load_table(&self, key: &CacheKey) -> Result<PropagationTable, CacheError> {
        let path = self.paths.table_file(&key.map_name);
        let mut reader = BufReader::new(File::open(&path)?);
        let table = read_table(&mut reader, key.checksum, key.num_leafs)?;
        tracing::info!(path = %path.display(), num_leafs = key.num_leafs, "loaded propagation table");
        Ok(table)
    }

    /// Save `table` for `key`, returning the file written.
    pub fn save_table(&self, key: &CacheKey, table: &PropagationTable) -> Result<PathBuf, CacheError> {
        let path = self.paths.table_file(&key.map_name);
        write_atomically(&path, |w| write_table(w, key.checksum, table))?;
        tracing::info!(path = %path.display(), "saved propagation table");
        Ok(path)
    }
}

/// Write through `encode` into a temporary sibling of `path`, then rename
/// it over `path`. A failed write leaves any previous file untouched.
fn write_atomically(
    path: &Path,
    encode: impl FnOnce(&mut dyn Write) -> Result<(), CacheError>,
) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = temp_sibling(path);
    let result = (|| -> Result<(), CacheError> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        encode(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
