//! Provision the full-text indexes retrieval depends on.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, SearchType, VectorBackend};
use crate::storage::Neo4jGraphStore;

/// Passage keyword index to create, when hybrid search against Neo4j needs one.
fn keyword_index(config: &Config) -> Option<&str> {
    match (config.vector.backend, config.vector.search_type) {
        (VectorBackend::Neo4j, SearchType::Hybrid) => Some(config.vector.keyword_index.as_str()),
        _ => None,
    }
}

pub async fn run(config: &Config) -> Result<()> {
    let store = Neo4jGraphStore::connect(&config.graph)
        .await
        .context("failed to connect to Neo4j")?;

    let index = &config.retrieval.fulltext_index;
    store
        .ensure_fulltext_index(index)
        .await
        .with_context(|| format!("failed to create full-text index '{}'", index))?;

    info!("Full-text index '{}' provisioned", index);
    println!("Full-text index '{}' is ready", index);

    if let Some(keyword) = keyword_index(config) {
        store
            .ensure_keyword_index(keyword)
            .await
            .with_context(|| format!("failed to create keyword index '{}'", keyword))?;
        println!("Keyword index '{}' is ready", keyword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_index_only_for_hybrid_neo4j() {
        let mut config = Config::default();
        config.vector.keyword_index = "passages".to_string();

        config.vector.backend = VectorBackend::Neo4j;
        config.vector.search_type = SearchType::Hybrid;
        assert_eq!(keyword_index(&config), Some("passages"));

        config.vector.search_type = SearchType::Vector;
        assert_eq!(keyword_index(&config), None);

        config.vector.backend = VectorBackend::Qdrant;
        config.vector.search_type = SearchType::Hybrid;
        assert_eq!(keyword_index(&config), None);
    }
}
