//! graph_rag CLI - main entry point
//!
//! Answers questions from a Neo4j knowledge graph plus a passage index.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use graph_rag::commands::{self, AskOptions};
use graph_rag::{metrics, Config};

#[derive(Parser)]
#[command(name = "graph_rag")]
#[command(about = "Question answering over a knowledge graph and document passages", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config.yml (defaults to ./config.yml, then ../config.yml)
    #[arg(long, global = true, env = "GRAPH_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Use in-memory stores loaded from this fixture instead of Neo4j/vector services
    #[arg(long, global = true, value_name = "FIXTURE")]
    offline: Option<PathBuf>,

    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, global = true, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// JSON file with prior turns as [["question", "answer"], ...]
        #[arg(long)]
        history: Option<PathBuf>,

        /// Also print the retrieved context
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },

    /// Interactive conversation; follow-ups are resolved against earlier turns
    Chat {
        /// Also print the retrieved context
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },

    /// Create the entity full-text index in Neo4j
    InitIndex,

    /// Print relationships from the graph
    Graph {
        /// Maximum relationships to print
        #[arg(short, long, default_value_t = commands::graph::DEFAULT_LIMIT)]
        limit: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path).map_err(anyhow::Error::msg),
        None => Ok(Config::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("graph_rag=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let config = load_config(cli.config.as_ref())?;
    let offline = cli.offline.as_deref();

    match cli.command {
        Commands::Ask {
            question,
            history,
            show_context,
        } => {
            commands::ask_run(
                &config,
                AskOptions {
                    question,
                    history,
                    show_context,
                },
                offline,
            )
            .await?;
        }
        Commands::Chat { show_context } => {
            commands::chat_run(&config, show_context, offline).await?;
        }
        Commands::InitIndex => {
            if offline.is_some() {
                warn!("--offline has no effect on init-index");
            }
            commands::init_index_run(&config).await?;
        }
        Commands::Graph { limit } => {
            commands::graph_run(&config, limit, offline).await?;
        }
    }

    Ok(())
}
