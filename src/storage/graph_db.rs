//! Knowledge graph access backed by Neo4j

use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::{debug, info};

use super::neo4j_vector::keyword_index_statement;
use crate::config::GraphSettings;
use crate::rag::store::{GraphEdge, GraphStore, MatchedNode};
use crate::{Error, Result};

const FULLTEXT_QUERY: &str = "CALL db.index.fulltext.queryNodes($index, $query, {limit: $limit})
     YIELD node, score
     RETURN elementId(node) AS element_id, node.id AS name, score";

const NEIGHBORHOOD_QUERY: &str = "MATCH (node) WHERE elementId(node) = $element_id
     CALL {
       WITH node
       MATCH (node)-[r]->(neighbor)
       WHERE type(r) <> $exclude
       RETURN node.id AS source, type(r) AS relation, neighbor.id AS target
       UNION ALL
       WITH node
       MATCH (node)<-[r]-(neighbor)
       WHERE type(r) <> $exclude
       RETURN neighbor.id AS source, type(r) AS relation, node.id AS target
     }
     RETURN source, relation, target
     LIMIT $limit";

const SAMPLE_QUERY: &str = "MATCH (s)-[r]->(t)
     WHERE type(r) <> $exclude
     RETURN s.id AS source, type(r) AS relation, t.id AS target
     LIMIT $limit";

/// Map a failed full-text call, recognising a missing index.
fn classify_fulltext_error(index: &str, message: String) -> Error {
    let lower = message.to_lowercase();
    if lower.contains("no such fulltext schema index")
        || (lower.contains("fulltext") && lower.contains("does not exist"))
    {
        Error::IndexUnavailable(index.to_string())
    } else {
        Error::GraphStore(message)
    }
}

/// Index names are spliced into DDL, so only `[A-Za-z0-9_]` is accepted.
pub(crate) fn check_index_name(index: &str) -> Result<()> {
    if index.is_empty() || !index.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::InvalidArgument(format!(
            "invalid full-text index name '{}'",
            index
        )));
    }
    Ok(())
}

/// Statement that provisions a full-text index over entity ids.
pub fn fulltext_index_statement(index: &str) -> Result<String> {
    check_index_name(index)?;
    Ok(format!(
        "CREATE FULLTEXT INDEX {} IF NOT EXISTS FOR (e:__Entity__) ON EACH [e.id]",
        index
    ))
}

/// Graph store backed by Neo4j
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl std::fmt::Debug for Neo4jGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraphStore").finish_non_exhaustive()
    }
}

impl Neo4jGraphStore {
    /// Connect to Neo4j server
    pub async fn connect(settings: &GraphSettings) -> Result<Self> {
        let graph = Graph::new(&settings.uri, &settings.username, &settings.password)
            .await
            .map_err(|e| Error::ConnectionError(format!("{}: {}", settings.uri, e)))?;
        info!("Connected to Neo4j at {}", settings.uri);
        Ok(Self { graph })
    }

    /// Shared connection handle, for backends living in the same database.
    pub fn graph(&self) -> Graph {
        self.graph.clone()
    }

    /// Create the entity full-text index if it is missing.
    pub async fn ensure_fulltext_index(&self, index: &str) -> Result<()> {
        let statement = fulltext_index_statement(index)?;
        self.graph.run(query(&statement)).await?;
        info!("Full-text index '{}' is ready", index);
        Ok(())
    }

    /// Create the passage keyword index used by hybrid search if it is missing.
    pub async fn ensure_keyword_index(&self, index: &str) -> Result<()> {
        let statement = keyword_index_statement(index)?;
        self.graph.run(query(&statement)).await?;
        info!("Keyword index '{}' is ready", index);
        Ok(())
    }

    /// First `limit` relationships of the graph, skipping `exclude_type`.
    pub async fn sample_relationships(
        &self,
        exclude_type: &str,
        limit: usize,
    ) -> Result<Vec<GraphEdge>> {
        let q = query(SAMPLE_QUERY)
            .param("exclude", exclude_type)
            .param("limit", limit as i64);
        self.collect_edges(q).await
    }

    async fn collect_edges(&self, q: neo4rs::Query) -> Result<Vec<GraphEdge>> {
        let mut result = self.graph.execute(q).await?;
        let mut edges = Vec::new();

        while let Some(row) = result.next().await? {
            if let (Ok(source), Ok(relation), Ok(target)) = (
                row.get::<String>("source"),
                row.get::<String>("relation"),
                row.get::<String>("target"),
            ) {
                edges.push(GraphEdge::new(source, relation, target));
            }
        }

        Ok(edges)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn query_full_text(
        &self,
        index: &str,
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<MatchedNode>> {
        let q = query(FULLTEXT_QUERY)
            .param("index", index)
            .param("query", query_text)
            .param("limit", limit as i64);

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| classify_fulltext_error(index, e.to_string()))?;

        let mut nodes = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| classify_fulltext_error(index, e.to_string()))?
        {
            let (Ok(element_id), Ok(name)) =
                (row.get::<String>("element_id"), row.get::<String>("name"))
            else {
                continue;
            };
            nodes.push(MatchedNode {
                element_id,
                name,
                score: row.get::<f64>("score").unwrap_or(0.0),
            });
        }

        debug!("Full-text '{}' matched {} nodes", query_text, nodes.len());
        Ok(nodes)
    }

    async fn traverse_neighbors(
        &self,
        node: &MatchedNode,
        exclude_type: &str,
        limit: usize,
    ) -> Result<Vec<GraphEdge>> {
        let q = query(NEIGHBORHOOD_QUERY)
            .param("element_id", node.element_id.as_str())
            .param("exclude", exclude_type)
            .param("limit", limit as i64);
        self.collect_edges(q).await
    }
}
