//! graphscope command-line tool.
//!
//! Provides the `graphscope` binary, which loads an exported JSON graph
//! document, optionally applies a scope, and prints derived views as JSON on
//! stdout. Diagnostics (collisions, dropped edges, cache activity) are
//! logged to stderr; set `GRAPHSCOPE_LOG` (or `RUST_LOG`) to control them.
//!
//! Uses the same `Explorer` session as any embedding application, so the
//! output matches what a dashboard would render for the same inputs.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use graphscope_core::{
    DatasetStats, EngineConfig, Explorer, GraphError, Label, Model, NetworkOptions, QueryState,
    RelType, Scope, SortColumn,
};

/// Explore scoped views of a discussion graph export.
#[derive(Parser)]
#[command(name = "graphscope", about = "Scoped views over discussion graph exports")]
struct Cli {
    /// Engine configuration file (JSON). Falls back to $GRAPHSCOPE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print per-model statistics of a graph export.
    Stats {
        /// Path to the graph document.
        #[arg(short, long)]
        graph: PathBuf,
    },
    /// Apply a scope and print the annotated graph with in-scope counts.
    Scope {
        #[arg(short, long)]
        graph: PathBuf,

        /// Scope as JSON, e.g. '{"code": ["code_42"]}'.
        #[arg(short, long)]
        scope: Option<String>,
    },
    /// Print a filtered network view.
    Network {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long)]
        scope: Option<String>,

        /// Node labels to keep, comma-separated (default: all).
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Edge types to keep, comma-separated (default: all).
        #[arg(long, value_delimiter = ',')]
        edges: Vec<String>,
    },
    /// Print a table view.
    Table {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long)]
        scope: Option<String>,

        /// Model to tabulate: user, post, code, topic, annotation.
        #[arg(short, long)]
        model: String,

        /// Sort criteria, e.g. `posts:desc,name`.
        #[arg(long, value_delimiter = ',')]
        sort: Vec<String>,
    },
    /// Render the dashboard modules described by a query string.
    Render {
        #[arg(short, long)]
        graph: PathBuf,

        /// Dashboard query string, e.g. 'm=cn|ct&scope.code=code_42'.
        #[arg(short, long)]
        query: String,
    },
}

/// Errors reported by the CLI, mapped to exit codes by [`CliError::exit_code`].
#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// 1 = bad input, 3 = I/O error.
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } => 3,
            CliError::Json { .. } | CliError::Graph(_) | CliError::Usage(_) => 1,
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRAPHSCOPE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Stats { graph } => {
            let explorer = open(&graph, config)?;
            let dataset = explorer.dataset();
            print_json(&json!({
                "attributes": dataset.graph.attributes(),
                "stats": dataset.stats,
                "models": model_summary(explorer.config(), &dataset.stats),
                "nodes": dataset.graph.node_count(),
                "edges": dataset.graph.edge_count(),
                "collisions": dataset.collisions,
            }));
        }
        Commands::Scope { graph, scope } => {
            let mut explorer = open(&graph, config)?;
            explorer.set_scope(parse_scope(scope.as_deref())?);
            print_json(explorer.scoped());
        }
        Commands::Network {
            graph,
            scope,
            labels,
            edges,
        } => {
            let mut explorer = open(&graph, config)?;
            explorer.set_scope(parse_scope(scope.as_deref())?);
            let options = NetworkOptions::new(
                labels.iter().filter(|s| !s.is_empty()).map(|s| Label::from(s.as_str())),
                edges.iter().filter(|s| !s.is_empty()).map(|s| RelType::from(s.as_str())),
            );
            print_json(&*explorer.network(&options));
        }
        Commands::Table {
            graph,
            scope,
            model,
            sort,
        } => {
            let model = Model::parse(&model)
                .ok_or_else(|| CliError::Usage(format!("unknown model '{}'", model)))?;
            let sort = sort
                .iter()
                .map(|s| {
                    SortColumn::parse(s)
                        .ok_or_else(|| CliError::Usage(format!("invalid sort criterion '{}'", s)))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut explorer = open(&graph, config)?;
            explorer.set_scope(parse_scope(scope.as_deref())?);
            let mut table = (*explorer.table(model)).clone();
            table.sort_rows(&sort);
            print_json(&table);
        }
        Commands::Render { graph, query } => {
            let state = QueryState::from_query(&query);
            if state.modules.is_empty() {
                return Err(CliError::Usage(format!(
                    "query '{}' selects no known module",
                    query
                )));
            }
            let mut explorer = open(&graph, config)?;
            explorer.set_scope(state.scope.clone());

            let mut rendered = serde_json::Map::new();
            for module in &state.modules {
                let output = explorer.render(*module, state.module_state(*module));
                let value = serde_json::to_value(&output).map_err(|source| CliError::Json {
                    what: "module output",
                    source,
                })?;
                rendered.insert(module.id().to_string(), json!({
                    "title": module.title(),
                    "view": value,
                }));
            }
            print_json(&json!({
                "query": state.to_query_string(),
                "counts": explorer.scoped().counts,
                "modules": rendered,
            }));
        }
    }
    Ok(())
}

/// `--config`, else `$GRAPHSCOPE_CONFIG`, else the built-in defaults.
fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, CliError> {
    let path = path.or_else(|| std::env::var_os("GRAPHSCOPE_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading engine configuration");
            let text = read(&path)?;
            EngineConfig::from_json(&text).map_err(|source| CliError::Json {
                what: "engine configuration",
                source,
            })
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Per-model counts with the configured display name and icon.
fn model_summary(config: &EngineConfig, stats: &DatasetStats) -> Vec<serde_json::Value> {
    Model::ALL
        .iter()
        .map(|&model| {
            let model_config = config.model(model);
            json!({
                "model": model,
                "label": model_config.label,
                "icon": model_config.icon,
                "count": stats.count(model),
            })
        })
        .collect()
}

fn open(path: &Path, config: EngineConfig) -> Result<Explorer, CliError> {
    let text = read(path)?;
    let mut explorer = Explorer::new(config);
    explorer.load_json(&text)?;
    Ok(explorer)
}

fn parse_scope(scope: Option<&str>) -> Result<Scope, CliError> {
    match scope {
        Some(json) => serde_json::from_str(json).map_err(|source| CliError::Json {
            what: "scope",
            source,
        }),
        None => Ok(Scope::default()),
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}
