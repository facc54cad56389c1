//! Wire collaborators from configuration into an [`AnswerPipeline`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::{Config, VectorBackend};
use crate::integrations::OpenAIClient;
use crate::rag::{
    AnswerPipeline, Fixture, GraphStore, MemoryGraph, MemoryVectorStore, PipelineDeps,
    VectorSearch,
};
use crate::storage::{Embedder, EmbeddingService, Neo4jGraphStore, Neo4jVectorStore, QdrantVectorStore};

/// In-memory stores loaded from a fixture file, index provisioned under the
/// configured name.
pub fn fixture_stores(config: &Config, path: &Path) -> Result<(MemoryGraph, MemoryVectorStore)> {
    let fixture = Fixture::load(path)
        .with_context(|| format!("failed to load fixture {}", path.display()))?;

    let mut graph = MemoryGraph::from_fixture(&fixture);
    graph.ensure_fulltext_index(&config.retrieval.fulltext_index);
    let vectors = MemoryVectorStore::from_fixture(&fixture, config.vector.top_k);

    info!(
        "Offline stores: {} entities, {} relationships, {} passages",
        graph.node_count(),
        graph.edge_count(),
        vectors.len()
    );
    Ok((graph, vectors))
}

/// Fail early when the passage collection is absent instead of on first search.
fn require_collection(collection: &str, exists: bool) -> Result<()> {
    if !exists {
        bail!(
            "Qdrant collection '{}' does not exist; ingest documents or set vector.collection",
            collection
        );
    }
    Ok(())
}

async fn service_stores(
    config: &Config,
) -> Result<(Arc<dyn GraphStore>, Arc<dyn VectorSearch>)> {
    let graph = Neo4jGraphStore::connect(&config.graph)
        .await
        .context("failed to connect to Neo4j")?;

    let embedder: Arc<dyn Embedder> = Arc::new(
        EmbeddingService::new(&config.openai).context("failed to create embedding service")?,
    );

    let vectors: Arc<dyn VectorSearch> = match config.vector.backend {
        VectorBackend::Qdrant => {
            let store = QdrantVectorStore::connect(&config.vector, embedder)
                .context("failed to create Qdrant client")?;
            let exists = store
                .collection_exists()
                .await
                .context("failed to reach Qdrant")?;
            require_collection(&config.vector.collection, exists)?;
            Arc::new(store)
        }
        VectorBackend::Neo4j => Arc::new(Neo4jVectorStore::new(
            graph.graph(),
            &config.vector,
            embedder,
        )),
    };

    Ok((Arc::new(graph), vectors))
}

/// Build the pipeline against live services, or against `fixture` when given.
pub async fn build_pipeline(config: &Config, fixture: Option<&Path>) -> Result<AnswerPipeline> {
    let llm = Arc::new(OpenAIClient::new(&config.openai).context("failed to create LLM client")?);

    let (graph, vectors): (Arc<dyn GraphStore>, Arc<dyn VectorSearch>) = match fixture {
        Some(path) => {
            let (graph, vectors) = fixture_stores(config, path)?;
            (Arc::new(graph), Arc::new(vectors))
        }
        None => service_stores(config).await?,
    };

    let deps = PipelineDeps::with_llm(graph, vectors, llm);
    Ok(AnswerPipeline::new(deps, config.retrieval.clone()))
}
