//! Print a sample of the knowledge graph.

use std::path::Path;

use anyhow::{Context, Result};

use super::backend::fixture_stores;
use crate::config::Config;
use crate::rag::{GraphEdge, RelationshipLine};
use crate::storage::Neo4jGraphStore;

/// Default number of relationships shown.
pub const DEFAULT_LIMIT: usize = 50;

/// One `source - TYPE -> target` line per edge.
pub fn format_edges(edges: Vec<GraphEdge>) -> String {
    edges
        .into_iter()
        .map(|edge| format!("{}\n", RelationshipLine::from(edge)))
        .collect()
}

pub async fn run(config: &Config, limit: usize, offline: Option<&Path>) -> Result<()> {
    let exclude = config.retrieval.exclude_relation.as_str();

    let edges = match offline {
        Some(path) => {
            let (graph, _) = fixture_stores(config, path)?;
            graph.sample_relationships(exclude, limit)
        }
        None => {
            let store = Neo4jGraphStore::connect(&config.graph)
                .await
                .context("failed to connect to Neo4j")?;
            store.sample_relationships(exclude, limit).await?
        }
    };

    if edges.is_empty() {
        println!("(no relationships)");
    } else {
        print!("{}", format_edges(edges));
    }
    Ok(())
}
