//! Passage similarity search backed by Qdrant

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::{SearchPointsBuilder, Value as QdrantValue};
use qdrant_client::Qdrant;
use tracing::{debug, info};

use super::embeddings::Embedder;
use crate::config::VectorSettings;
use crate::rag::store::VectorSearch;
use crate::Result;

/// Payload keys checked for the passage text, in order.
const TEXT_KEYS: [&str; 2] = ["text", "page_content"];

fn passage_text(payload: &HashMap<String, QdrantValue>) -> Option<String> {
    TEXT_KEYS
        .iter()
        .find_map(|key| payload.get(*key)?.as_str().map(|s| s.to_string()))
}

/// Vector store backed by Qdrant
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    top_k: usize,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for QdrantVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantVectorStore")
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl QdrantVectorStore {
    /// Connect to Qdrant server
    pub fn connect(settings: &VectorSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let client = Qdrant::from_url(&settings.url).build()?;
        info!(
            "Using Qdrant collection '{}' at {}",
            settings.collection, settings.url
        );

        Ok(Self {
            client,
            collection: settings.collection.clone(),
            top_k: settings.top_k.max(1),
            embedder,
        })
    }

    /// Whether the configured collection exists.
    pub async fn collection_exists(&self) -> Result<bool> {
        Ok(self.client.collection_exists(&self.collection).await?)
    }
}

#[async_trait]
impl VectorSearch for QdrantVectorStore {
    async fn similarity_search(&self, query: &str) -> Result<Vec<String>> {
        let embedding = self.embedder.embed(query).await?;
        if embedding.is_empty() {
            return Ok(Vec::new());
        }

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding, self.top_k as u64)
                    .with_payload(true),
            )
            .await?;

        let passages: Vec<String> = results
            .result
            .into_iter()
            .filter_map(|point| passage_text(&point.payload))
            .collect();

        debug!(
            "Qdrant returned {} passages from '{}'",
            passages.len(),
            self.collection
        );
        Ok(passages)
    }
}
