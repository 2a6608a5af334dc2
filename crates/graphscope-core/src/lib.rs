pub mod id;
pub mod error;
pub mod types;
pub mod node;
pub mod edge;
pub mod graph;
pub mod document;
pub mod columns;
pub mod config;
pub mod normalize;
pub mod scope;
pub mod filter;
pub mod table;
pub mod cache;
pub mod dataset;
pub mod dashboard;
pub mod query_state;
pub mod explorer;

// Re-export commonly used types
pub use id::{NodeKey, EdgeKey};
pub use error::GraphError;
pub use types::{Label, Model, RelType};
pub use node::{Node, NodeAttributes, Properties};
pub use edge::{Edge, EdgeAttributes, EdgeEntry};
pub use graph::PropertyGraph;
pub use document::GraphDocument;
pub use columns::{Column, ColumnType, Derivation};
pub use config::{EngineConfig, ModelConfig, ScopeCombinator};
pub use normalize::{normalize, IdMap, Normalized};
pub use scope::{Scope, ScopeCount, ScopeCounts, ScopeDimension, ScopeEngine, ScopedGraph};
pub use filter::{FilteredGraph, NetworkOptions, ViewFilter, WeightBounds};
pub use table::{Row, SortColumn, SortDirection, TableData, TableOptions, TableProjector};
pub use cache::{CacheKey, ViewCache};
pub use dataset::{Dataset, DatasetStats};
pub use dashboard::{DashboardModule, ModuleView};
pub use query_state::QueryState;
pub use explorer::{Explorer, ModuleOutput};
