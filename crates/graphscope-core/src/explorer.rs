//! Explorer session: the current dataset, the current scope and the derived
//! views computed from them.
//!
//! The session owns exactly one dataset and one scope. Every scope change
//! re-runs the scope engine against the current dataset; every reload bumps
//! the dataset generation, re-applies the current scope and clears the view
//! caches, so no derived view can be served from a previous dataset.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheKey, ViewCache};
use crate::config::EngineConfig;
use crate::dashboard::{DashboardModule, ModuleView};
use crate::dataset::Dataset;
use crate::document::GraphDocument;
use crate::error::GraphError;
use crate::filter::{FilteredGraph, NetworkOptions, ViewFilter};
use crate::id::NodeKey;
use crate::query_state::ModuleState;
use crate::scope::{Scope, ScopeDimension, ScopeEngine, ScopedGraph};
use crate::table::{SortColumn, TableData, TableOptions, TableProjector};
use crate::types::Model;

/// Module state key holding a comma-separated list of sort columns.
pub const SORT_STATE_KEY: &str = "sort";

/// The rendered content of a dashboard module.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ModuleOutput {
    Network(Arc<FilteredGraph>),
    Table(Arc<TableData>),
}

#[derive(Debug)]
pub struct Explorer {
    config: EngineConfig,
    generation: u64,
    dataset: Dataset,
    scope: Scope,
    scoped: ScopedGraph,
    networks: ViewCache<FilteredGraph>,
    tables: ViewCache<TableData>,
}

impl Explorer {
    /// A session with an empty dataset.
    pub fn new(config: EngineConfig) -> Self {
        let dataset = Dataset::default();
        let scoped = ScopeEngine::new(&config).apply(&dataset.graph, None);
        Explorer {
            config,
            generation: 0,
            dataset,
            scope: Scope::default(),
            scoped,
            networks: ViewCache::new(),
            tables: ViewCache::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Incremented on every successful load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The current dataset annotated for the current scope.
    pub fn scoped(&self) -> &ScopedGraph {
        &self.scoped
    }

    // -----------------------------------------------------------------------
    // Dataset
    // -----------------------------------------------------------------------

    /// Replaces the current dataset. On error the session is unchanged.
    pub fn load(&mut self, doc: GraphDocument) -> Result<&Dataset, GraphError> {
        let dataset = Dataset::from_document(doc, &self.config)?;
        self.dataset = dataset;
        self.generation += 1;
        self.networks.clear();
        self.tables.clear();
        self.rescope();
        tracing::info!(generation = self.generation, "dataset replaced");
        Ok(&self.dataset)
    }

    pub fn load_json(&mut self, json: &str) -> Result<&Dataset, GraphError> {
        self.load(GraphDocument::from_json(json)?)
    }

    // -----------------------------------------------------------------------
    // Scope
    // -----------------------------------------------------------------------

    pub fn set_scope(&mut self, scope: Scope) {
        if scope != self.scope {
            self.scope = scope;
            self.rescope();
        }
    }

    /// Pins a node. Returns `false` if it was already pinned.
    pub fn add_to_scope(&mut self, dim: ScopeDimension, key: impl Into<NodeKey>) -> bool {
        let added = self.scope.insert(dim, key);
        if added {
            self.rescope();
        }
        added
    }

    /// Unpins a node. Returns `false` if it was not pinned.
    pub fn remove_from_scope(&mut self, dim: ScopeDimension, key: &str) -> bool {
        let removed = self.scope.remove(dim, key);
        if removed {
            self.rescope();
        }
        removed
    }

    pub fn clear_scope(&mut self) {
        self.set_scope(Scope::default());
    }

    fn rescope(&mut self) {
        let engine = ScopeEngine::new(&self.config);
        self.scoped = engine.apply(&self.dataset.graph, Some(&self.scope));
        tracing::debug!(generation = self.generation, "scope re-applied");
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// Network view of the scoped graph.
    pub fn network(&mut self, options: &NetworkOptions) -> Arc<FilteredGraph> {
        let key = CacheKey::compute(
            self.generation,
            &self.scoped.counts,
            "network",
            options,
            &self.scope,
        );
        let compute = || ViewFilter::new(&self.config).filter(&self.scoped.graph, options);
        match key {
            Ok(key) => self.networks.get_or_insert_with(key, compute),
            Err(err) => {
                tracing::warn!(error = %err, "cannot key network view, computing uncached");
                Arc::new(compute())
            }
        }
    }

    /// Table of `model` nodes in the scoped graph.
    pub fn table(&mut self, model: Model) -> Arc<TableData> {
        let mut options = TableOptions::new(model);
        if !self.scope.is_empty() {
            options = options.with_scope(self.scope.clone());
        }
        let key = CacheKey::compute(
            self.generation,
            &self.scoped.counts,
            "table",
            &options,
            &self.scope,
        );
        let compute = || TableProjector::new(&self.config).project(&self.scoped.graph, &options);
        match key {
            Ok(key) => self.tables.get_or_insert_with(key, compute),
            Err(err) => {
                tracing::warn!(error = %err, "cannot key table view, computing uncached");
                Arc::new(compute())
            }
        }
    }

    /// Renders a dashboard module. Table modules honour a `sort` entry in
    /// their state (`column:dir,column:dir`); unparsable criteria are ignored.
    pub fn render(&mut self, module: DashboardModule, state: Option<&ModuleState>) -> ModuleOutput {
        match module.view() {
            ModuleView::Network(options) => ModuleOutput::Network(self.network(&options)),
            ModuleView::Table(model) => {
                let table = self.table(model);
                let sort: Vec<SortColumn> = state
                    .and_then(|s| s.get(SORT_STATE_KEY))
                    .map(|criteria| criteria.split(',').filter_map(SortColumn::parse).collect())
                    .unwrap_or_default();
                if sort.is_empty() {
                    return ModuleOutput::Table(table);
                }
                let mut sorted = TableData::clone(&table);
                sorted.sort_rows(&sort);
                ModuleOutput::Table(Arc::new(sorted))
            }
        }
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Explorer::new(EngineConfig::default())
    }
}
