//! The load-or-build orchestrator and runtime query facade.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use hark_cache::{CacheError, CacheStore};
use hark_core::{CacheKey, LeafId, MapIdentity, SpatialQuery};
use hark_graph::{GraphBuilder, LeafGraph};
use hark_table::{IndirectPath, PropagationTable, TableBuilder};

use crate::config::{ConfigError, EngineConfig};
use crate::metrics::{ArtifactSource, BuildMetrics};

/// Owns the propagation data of the loaded map.
///
/// Construct one per audio subsystem, call
/// [`ensure_valid`](Self::ensure_valid) after every map load, and hand
/// [`table`](Self::table) to whatever needs to query paths. Until the
/// first successful pass every query answers "no path".
pub struct PropagationEngine {
    config: EngineConfig,
    store: Option<CacheStore>,
    key: Option<CacheKey>,
    graph: Option<Arc<LeafGraph<f32, u32>>>,
    table: Arc<PropagationTable>,
    metrics: BuildMetrics,
}

impl PropagationEngine {
    /// Create an engine with no map loaded.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = config.cache_root.clone().map(CacheStore::new);
        Ok(Self {
            config,
            store,
            key: None,
            graph: None,
            table: Arc::new(PropagationTable::dummy()),
            metrics: BuildMetrics::default(),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metrics of the last pass that did work.
    pub fn metrics(&self) -> &BuildMetrics {
        &self.metrics
    }

    /// Key of the map the current data was produced for, if any pass
    /// succeeded since the last reset.
    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    /// The current leaf graph, if one was loaded or built.
    pub fn graph(&self) -> Option<&LeafGraph<f32, u32>> {
        self.graph.as_deref()
    }

    /// Shared handle to the current table.
    pub fn table(&self) -> Arc<PropagationTable> {
        Arc::clone(&self.table)
    }

    /// Cache file paths for `map`, if the disk cache is enabled.
    pub fn cache_files(&self, map: &MapIdentity) -> Option<(PathBuf, PathBuf)> {
        let paths = self.store.as_ref()?.paths();
        Some((paths.graph_file(&map.name), paths.table_file(&map.name)))
    }

    /// Drop all data, as on map unload.
    pub fn reset(&mut self) {
        self.key = None;
        self.graph = None;
        self.table = Arc::new(PropagationTable::dummy());
        self.metrics = BuildMetrics::default();
    }

    /// Make the data match the map described by `spatial` and `map`.
    ///
    /// Returns immediately if the data was already produced for the same
    /// name, checksum and leaf count. Otherwise each artifact is loaded
    /// from the cache or built and saved. Failures never escape: a map
    /// that cannot be processed gets the placeholder table, and the next
    /// call tries again.
    pub fn ensure_valid(&mut self, spatial: Arc<dyn SpatialQuery>, map: &MapIdentity) -> ArtifactSource {
        let num_leafs = spatial.num_leafs();
        let key = CacheKey::new(map, u32::try_from(num_leafs).unwrap_or(u32::MAX));
        if self.key.as_ref() == Some(&key) {
            tracing::debug!(%key, "propagation data already valid");
            return ArtifactSource::Memory;
        }

        self.reset();
        let started = Instant::now();
        let mut metrics = BuildMetrics {
            num_leafs,
            ..Default::default()
        };

        let phase = Instant::now();
        let graph = self.obtain_graph(spatial, &key, &mut metrics);
        metrics.graph_us = phase.elapsed().as_micros() as u64;

        let table = match &graph {
            Some(graph) => {
                let phase = Instant::now();
                let table = self.obtain_table(graph, &key, &mut metrics);
                metrics.table_us = phase.elapsed().as_micros() as u64;
                table
            }
            None => {
                metrics.graph_source = ArtifactSource::Degraded;
                metrics.table_source = ArtifactSource::Degraded;
                PropagationTable::dummy()
            }
        };

        let (direct, indirect) = table.path_counts();
        metrics.direct_pairs = direct;
        metrics.indirect_pairs = indirect;
        metrics.memory_bytes =
            table.memory_bytes() + graph.as_ref().map_or(0, LeafGraph::memory_bytes);
        metrics.total_us = started.elapsed().as_micros() as u64;

        let source = metrics.table_source;
        tracing::info!(
            %key,
            graph = ?metrics.graph_source,
            table = ?metrics.table_source,
            direct,
            indirect,
            total_ms = metrics.total_us / 1000,
            "propagation data ready"
        );

        if !metrics.is_degraded() {
            self.key = Some(key);
        }
        self.graph = graph.map(Arc::new);
        self.table = Arc::new(table);
        self.metrics = metrics;
        source
    }

    /// Whether sound reaches `to` from `from` in a straight line.
    pub fn has_direct_path(&self, from: LeafId, to: LeafId) -> bool {
        self.table.has_direct_path(from, to)
    }

    /// Whether sound reaches `to` from `from` only around corners.
    pub fn has_indirect_path(&self, from: LeafId, to: LeafId) -> bool {
        self.table.has_indirect_path(from, to)
    }

    /// Distance and arrival direction of the indirect path, if any.
    pub fn indirect_path_props(&self, from: LeafId, to: LeafId) -> Option<IndirectPath> {
        self.table.indirect_path_props(from, to)
    }

    fn obtain_graph(
        &self,
        spatial: Arc<dyn SpatialQuery>,
        key: &CacheKey,
        metrics: &mut BuildMetrics,
    ) -> Option<LeafGraph<f32, u32>> {
        if let Some(graph) = self.load(key, metrics, "graph", |s, k| s.load_graph(k)) {
            metrics.graph_source = ArtifactSource::Cache;
            return Some(graph);
        }

        match GraphBuilder::new(spatial, self.config.effective_graph()).build::<f32, u32>() {
            Ok(build) => {
                metrics.graph_source = ArtifactSource::Built;
                metrics.graph_tasks = build.tasks;
                metrics.graph_pairs = build.pairs;
                self.save(key, metrics, "graph", |s, k| s.save_graph(k, &build.graph));
                Some(build.graph)
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "leaf graph build failed, using placeholder data");
                None
            }
        }
    }

    fn obtain_table(
        &self,
        graph: &LeafGraph<f32, u32>,
        key: &CacheKey,
        metrics: &mut BuildMetrics,
    ) -> PropagationTable {
        if let Some(table) = self.load(key, metrics, "table", |s, k| s.load_table(k)) {
            metrics.table_source = ArtifactSource::Cache;
            return table;
        }

        let Some(wide) = LeafGraph::<f64, u32>::try_adopt(graph) else {
            tracing::warn!(%key, "leaf graph cannot be widened, using placeholder table");
            metrics.table_source = ArtifactSource::Degraded;
            return PropagationTable::dummy();
        };

        match TableBuilder::new(self.config.effective_table()).build(&wide) {
            Ok(build) if build.degraded => {
                metrics.table_source = ArtifactSource::Degraded;
                build.table
            }
            Ok(build) => {
                metrics.table_source = ArtifactSource::Built;
                metrics.table_tasks = build.tasks;
                metrics.table_searches = build.searches;
                self.save(key, metrics, "table", |s, k| s.save_table(k, &build.table));
                build.table
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "propagation table build failed, using placeholder");
                metrics.table_source = ArtifactSource::Degraded;
                PropagationTable::dummy()
            }
        }
    }

    fn load<T>(
        &self,
        key: &CacheKey,
        metrics: &mut BuildMetrics,
        what: &'static str,
        load: impl FnOnce(&CacheStore, &CacheKey) -> Result<T, CacheError>,
    ) -> Option<T> {
        if !self.config.cache_mode.reads() {
            return None;
        }
        let store = self.store.as_ref()?;
        match load(store, key) {
            Ok(value) => Some(value),
            Err(e) if e.is_not_found() => {
                tracing::debug!(what, %key, "no cache file");
                None
            }
            Err(e) => {
                metrics.rejected_files += 1;
                tracing::warn!(what, %key, error = %e, "cache file rejected, rebuilding");
                None
            }
        }
    }

    fn save(
        &self,
        key: &CacheKey,
        metrics: &mut BuildMetrics,
        what: &'static str,
        save: impl FnOnce(&CacheStore, &CacheKey) -> Result<PathBuf, CacheError>,
    ) {
        if !self.config.cache_mode.writes() {
            return;
        }
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = save(store, key) {
            metrics.save_failures += 1;
            tracing::warn!(what, %key, error = %e, "could not save cache file");
        }
    }
}
