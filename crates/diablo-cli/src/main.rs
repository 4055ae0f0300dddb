//! `diablo`: inspect and traverse a graph loaded from a JSONL directory or a GraphML file.
//!
//! Usage:
//!   `diablo stats ./people`
//!   `diablo neighbors ./people.graphml alice --relationship knows`
//!   `diablo walk ./people alice --relationship knows --hops 2 --json`

mod commands;

use clap::{Parser, Subcommand};
use diablo_types::GraphConfig;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "diablo")]
#[command(author, version, about = "Diablo - in-memory graph traversal")]
#[command(propagate_version = true)]
struct Cli {
    /// Branching order of the node index [default: $DIABLO_BTREE_ORDER, else 16]
    #[arg(long, global = true)]
    order: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show node and edge counts
    Stats {
        /// Directory with nodes.jsonl/edges.jsonl, or a .graphml file
        source: PathBuf,
    },

    /// List the outgoing edges of one node
    Neighbors {
        /// Directory with nodes.jsonl/edges.jsonl, or a .graphml file
        source: PathBuf,

        /// Node id
        id: String,

        /// Only follow edges with this label
        #[arg(short, long)]
        relationship: Option<String>,
    },

    /// Expand from seed nodes and print where the walk ends up
    Walk {
        /// Directory with nodes.jsonl/edges.jsonl, or a .graphml file
        source: PathBuf,

        /// Seed node ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Only follow edges with this label
        #[arg(short, long)]
        relationship: Option<String>,

        /// Number of expansion steps
        #[arg(long, default_value_t = 1)]
        hops: usize,

        /// Print one JSON object per node instead of bare ids
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli
        .order
        .map(GraphConfig::with_order)
        .unwrap_or_else(GraphConfig::from_env);
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Stats { source } => {
            let graph = commands::open(&source, &config)?;
            commands::stats(&graph, &mut out)?;
        }
        Commands::Neighbors {
            source,
            id,
            relationship,
        } => {
            let graph = commands::open(&source, &config)?;
            commands::neighbors(&graph, &id, relationship.as_deref(), &mut out)?;
        }
        Commands::Walk {
            source,
            ids,
            relationship,
            hops,
            json,
        } => {
            let graph = commands::open(&source, &config)?;
            let request = commands::WalkRequest {
                ids,
                relationship,
                hops,
                json,
            };
            commands::walk(&graph, &request, &mut out)?;
        }
    }
    Ok(())
}
