//! Structured retrieval: the relationship neighborhood of named entities.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::fulltext::build_full_text_query;
use super::store::{GraphEdge, GraphStore};
use crate::config::RetrievalLimits;
use crate::{Error, Result};

/// One edge rendered as `source - TYPE -> target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipLine {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl From<GraphEdge> for RelationshipLine {
    fn from(edge: GraphEdge) -> Self {
        Self {
            source: edge.source,
            relation: edge.relation,
            target: edge.target,
        }
    }
}

impl fmt::Display for RelationshipLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} -> {}", self.source, self.relation, self.target)
    }
}

/// Ordered relationship lines for every entity in a question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredContext {
    pub lines: Vec<RelationshipLine>,
}

impl StructuredContext {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl fmt::Display for StructuredContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Looks entities up in the full-text index and collects their edges.
#[derive(Clone)]
pub struct GraphNeighborhoodCollector {
    store: Arc<dyn GraphStore>,
    limits: RetrievalLimits,
}

impl fmt::Debug for GraphNeighborhoodCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNeighborhoodCollector")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl GraphNeighborhoodCollector {
    pub fn new(store: Arc<dyn GraphStore>, limits: RetrievalLimits) -> Self {
        Self { store, limits }
    }

    /// Collect relationship lines for `entities`, in entity order.
    ///
    /// Per entity at most `fulltext_matches` nodes are matched and at most
    /// `neighbor_limit` lines are kept across those nodes. Entities with no
    /// match contribute nothing.
    pub async fn collect(&self, entities: &[String]) -> Result<StructuredContext> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();

        for entity in entities {
            if self.limits.dedupe_entities && !seen.insert(entity.as_str()) {
                continue;
            }
            lines.extend(self.collect_entity(entity).await?);
        }

        debug!(
            "Collected {} relationship lines for {} entities",
            lines.len(),
            entities.len()
        );
        Ok(StructuredContext { lines })
    }

    async fn collect_entity(&self, entity: &str) -> Result<Vec<RelationshipLine>> {
        let query = match build_full_text_query(entity) {
            Ok(query) => query,
            Err(Error::EmptyInput(name)) => {
                warn!("Skipping entity '{}': no searchable tokens", name);
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        debug!("Full-text query for '{}': {}", entity, query);
        let nodes = self
            .store
            .query_full_text(
                &self.limits.fulltext_index,
                &query,
                self.limits.fulltext_matches,
            )
            .await?;

        let mut lines = Vec::new();
        for node in nodes.iter().take(self.limits.fulltext_matches) {
            let remaining = self.limits.neighbor_limit.saturating_sub(lines.len());
            if remaining == 0 {
                break;
            }

            let edges = self
                .store
                .traverse_neighbors(node, &self.limits.exclude_relation, remaining)
                .await?;

            lines.extend(
                edges
                    .into_iter()
                    .filter(|edge| edge.relation != self.limits.exclude_relation)
                    .take(remaining)
                    .map(RelationshipLine::from),
            );
        }

        Ok(lines)
    }
}
