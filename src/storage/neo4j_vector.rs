//! Passage search over `Document` nodes kept in Neo4j.
//!
//! Vector mode ranks by embedding similarity alone. Hybrid mode also runs a
//! keyword query over a full-text index on `Document.text`, scales each result
//! list by its best score and keeps the higher score for passages found twice.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::debug;

use super::embeddings::Embedder;
use super::graph_db::check_index_name;
use crate::config::{SearchType, VectorSettings};
use crate::rag::fulltext::remove_lucene_chars;
use crate::rag::store::VectorSearch;
use crate::Result;

const VECTOR_QUERY: &str = "CALL db.index.vector.queryNodes($index, $k, $embedding)
     YIELD node, score
     RETURN elementId(node) AS element_id, node.text AS text, score
     ORDER BY score DESC";

const KEYWORD_QUERY: &str = "CALL db.index.fulltext.queryNodes($index, $query, {limit: $k})
     YIELD node, score
     RETURN elementId(node) AS element_id, node.text AS text, score
     ORDER BY score DESC";

/// Statement that provisions the keyword index over passage text.
pub fn keyword_index_statement(index: &str) -> Result<String> {
    check_index_name(index)?;
    Ok(format!(
        "CREATE FULLTEXT INDEX {} IF NOT EXISTS FOR (n:Document) ON EACH [n.text]",
        index
    ))
}

/// One row returned by either index.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub element_id: String,
    pub text: String,
    pub score: f64,
}

impl ScoredPassage {
    pub fn new(element_id: impl Into<String>, text: impl Into<String>, score: f64) -> Self {
        Self {
            element_id: element_id.into(),
            text: text.into(),
            score,
        }
    }
}

fn scale_by_max(mut passages: Vec<ScoredPassage>) -> Vec<ScoredPassage> {
    let max = passages.iter().map(|p| p.score).fold(0.0_f64, f64::max);
    if max > 0.0 {
        for passage in &mut passages {
            passage.score /= max;
        }
    }
    passages
}

/// Merge vector and keyword hits into the `k` best passages.
///
/// Each list is divided by its own maximum score first, so the two scales
/// become comparable. A node present in both lists keeps its higher score.
/// Equal scores keep first-seen order, vector hits before keyword hits.
pub fn merge_hybrid(
    vector: Vec<ScoredPassage>,
    keyword: Vec<ScoredPassage>,
    k: usize,
) -> Vec<String> {
    let mut merged: Vec<ScoredPassage> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for passage in scale_by_max(vector)
        .into_iter()
        .chain(scale_by_max(keyword))
    {
        match seen.get(&passage.element_id) {
            Some(&slot) => {
                if passage.score > merged[slot].score {
                    merged[slot].score = passage.score;
                }
            }
            None => {
                seen.insert(passage.element_id.clone(), merged.len());
                merged.push(passage);
            }
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.into_iter().take(k).map(|p| p.text).collect()
}

pub struct Neo4jVectorStore {
    graph: Graph,
    index: String,
    keyword_index: String,
    search_type: SearchType,
    top_k: usize,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for Neo4jVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jVectorStore")
            .field("index", &self.index)
            .field("keyword_index", &self.keyword_index)
            .field("search_type", &self.search_type)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Neo4jVectorStore {
    pub fn new(graph: Graph, settings: &VectorSettings, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            graph,
            index: settings.index.clone(),
            keyword_index: settings.keyword_index.clone(),
            search_type: settings.search_type,
            top_k: settings.top_k.max(1),
            embedder,
        }
    }

    async fn collect(&self, q: neo4rs::Query) -> Result<Vec<ScoredPassage>> {
        let mut result = self.graph.execute(q).await?;
        let mut passages = Vec::new();
        while let Some(row) = result.next().await? {
            let (Ok(element_id), Ok(text)) =
                (row.get::<String>("element_id"), row.get::<String>("text"))
            else {
                continue;
            };
            passages.push(ScoredPassage {
                element_id,
                text,
                score: row.get::<f64>("score").unwrap_or(0.0),
            });
        }
        Ok(passages)
    }

    async fn vector_hits(&self, query_text: &str) -> Result<Vec<ScoredPassage>> {
        let embedding = self.embedder.embed(query_text).await?;
        if embedding.is_empty() {
            return Ok(Vec::new());
        }

        let embedding: Vec<f64> = embedding.into_iter().map(f64::from).collect();
        let q = query(VECTOR_QUERY)
            .param("index", self.index.as_str())
            .param("k", self.top_k as i64)
            .param("embedding", embedding);
        self.collect(q).await
    }

    async fn keyword_hits(&self, query_text: &str) -> Result<Vec<ScoredPassage>> {
        let cleaned = remove_lucene_chars(query_text);
        if cleaned.trim().is_empty() {
            return Ok(Vec::new());
        }

        let q = query(KEYWORD_QUERY)
            .param("index", self.keyword_index.as_str())
            .param("query", cleaned)
            .param("k", self.top_k as i64);
        self.collect(q).await
    }
}

#[async_trait]
impl VectorSearch for Neo4jVectorStore {
    async fn similarity_search(&self, query_text: &str) -> Result<Vec<String>> {
        let vector = self.vector_hits(query_text).await?;

        let passages = match self.search_type {
            SearchType::Vector => vector
                .into_iter()
                .take(self.top_k)
                .map(|p| p.text)
                .collect(),
            SearchType::Hybrid => {
                let keyword = self.keyword_hits(query_text).await?;
                debug!(
                    "Hybrid search: {} vector hits, {} keyword hits",
                    vector.len(),
                    keyword.len()
                );
                merge_hybrid(vector, keyword, self.top_k)
            }
        };

        debug!(
            "Vector index '{}' returned {} passages",
            self.index,
            passages.len()
        );
        Ok(passages)
    }
}
