//! Contracts for the external systems the pipeline talks to.
//!
//! Each trait is object-safe so handles can be injected as `Arc<dyn ...>`
//! per request. Concrete backends live in [`crate::storage`],
//! [`crate::integrations`] and [`super::memory`].

use async_trait::async_trait;

use crate::Result;

/// Node returned by a full-text index lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedNode {
    /// Store-specific handle used to traverse from this node
    pub element_id: String,
    /// Value of the indexed `id` property
    pub name: String,
    pub score: f64,
}

/// Directed relationship, already oriented `source -> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }
}

/// Graph database with a full-text index over entity nodes.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Best matches for `query` in the named full-text index, highest score first.
    async fn query_full_text(
        &self,
        index: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MatchedNode>>;

    /// Edges touching `node` in both directions, skipping `exclude_type`.
    async fn traverse_neighbors(
        &self,
        node: &MatchedNode,
        exclude_type: &str,
        limit: usize,
    ) -> Result<Vec<GraphEdge>>;
}

/// Semantic similarity lookup over document passages.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Passage texts nearest to `query`, closest first.
    async fn similarity_search(&self, query: &str) -> Result<Vec<String>>;
}

/// Schema-constrained language model call returning a list of names.
#[async_trait]
pub trait StructuredExtractionModel: Send + Sync {
    async fn extract(&self, system: &str, instruction: &str, question: &str)
        -> Result<Vec<String>>;
}

/// Plain text generation from a fully rendered prompt.
#[async_trait]
pub trait TextGenerationModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
