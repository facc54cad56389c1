//! In-memory graph and passage stores (no external services).
//!
//! `MemoryGraph` understands the `term~N AND term~N` queries produced by
//! [`super::fulltext::build_full_text_query`], matching each term against the
//! words of an entity id within `N` edits. `MemoryVectorStore` ranks passages
//! with deterministic hashed bag-of-words embeddings.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::store::{GraphEdge, GraphStore, MatchedNode, VectorSearch};
use crate::config::{DEFAULT_FULLTEXT_INDEX, DEFAULT_TOP_K};
use crate::storage::embeddings::Embedder;
use crate::{Error, Result};

static FUZZY_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)~(\d+)$").expect("valid fuzzy term regex"));

/// Parsed `word~N` term.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FuzzyTerm {
    word: String,
    distance: usize,
}

fn parse_query(query: &str) -> Vec<FuzzyTerm> {
    query
        .split(" AND ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|term| match FUZZY_TERM.captures(term) {
            Some(caps) => FuzzyTerm {
                word: caps[1].to_lowercase(),
                distance: caps[2].parse().unwrap_or(0),
            },
            None => FuzzyTerm {
                word: term.to_lowercase(),
                distance: 0,
            },
        })
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Best edit distance between `term` and any word of `name`, if within range.
fn term_distance(term: &FuzzyTerm, name: &str) -> Option<usize> {
    name.split_whitespace()
        .map(|word| levenshtein(&term.word, &word.to_lowercase()))
        .filter(|d| *d <= term.distance)
        .min()
}

/// Graph fixture: relationships as `[source, TYPE, target]` and passages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<(String, String, String)>,
    #[serde(default)]
    pub passages: Vec<String>,
}

impl Fixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// In-memory directed multigraph over entity ids.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    nodes: Vec<String>,
    positions: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    fulltext_index: Option<String>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    /// Empty graph with the default full-text index provisioned.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            positions: HashMap::new(),
            edges: Vec::new(),
            fulltext_index: Some(DEFAULT_FULLTEXT_INDEX.to_string()),
        }
    }

    /// Empty graph whose full-text index has not been created yet.
    pub fn without_fulltext_index() -> Self {
        Self {
            fulltext_index: None,
            ..Self::new()
        }
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut graph = Self::new();
        for entity in &fixture.entities {
            graph.add_entity(entity);
        }
        for (source, relation, target) in &fixture.relationships {
            graph.add_relationship(source, relation, target);
        }
        graph
    }

    /// Create or rename the full-text index.
    pub fn ensure_fulltext_index(&mut self, name: &str) {
        self.fulltext_index = Some(name.to_string());
    }

    pub fn add_entity(&mut self, id: &str) -> usize {
        if let Some(&pos) = self.positions.get(id) {
            return pos;
        }
        self.nodes.push(id.to_string());
        self.positions.insert(id.to_string(), self.nodes.len() - 1);
        self.nodes.len() - 1
    }

    pub fn add_relationship(&mut self, source: &str, relation: &str, target: &str) {
        self.add_entity(source);
        self.add_entity(target);
        self.edges.push(GraphEdge::new(source, relation, target));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First `limit` edges whose type is not `exclude_type`.
    pub fn sample_relationships(&self, exclude_type: &str, limit: usize) -> Vec<GraphEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.relation != exclude_type)
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn query_full_text(
        &self,
        index: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MatchedNode>> {
        if self.fulltext_index.as_deref() != Some(index) {
            return Err(Error::IndexUnavailable(index.to_string()));
        }

        let terms = parse_query(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<MatchedNode> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(pos, name)| {
                let distances: Option<Vec<usize>> =
                    terms.iter().map(|term| term_distance(term, name)).collect();
                let distances = distances?;
                let score = distances
                    .iter()
                    .map(|d| 1.0 / (1.0 + *d as f64))
                    .sum::<f64>()
                    / terms.len() as f64;
                Some(MatchedNode {
                    element_id: pos.to_string(),
                    name: name.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        debug!("MemoryGraph: '{}' matched {} nodes", query, matches.len());
        Ok(matches)
    }

    async fn traverse_neighbors(
        &self,
        node: &MatchedNode,
        exclude_type: &str,
        limit: usize,
    ) -> Result<Vec<GraphEdge>> {
        let outgoing = self
            .edges
            .iter()
            .filter(|edge| edge.source == node.name);
        let incoming = self
            .edges
            .iter()
            .filter(|edge| edge.target == node.name);

        Ok(outgoing
            .chain(incoming)
            .filter(|edge| edge.relation != exclude_type)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Deterministic, fast embedding for offline/local use.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vec = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dim;
            vec[idx] += 1.0;
        }

        normalize(&mut vec);
        vec
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Passage store ranked by cosine similarity of local embeddings.
#[derive(Debug, Clone)]
pub struct MemoryVectorStore {
    embedder: LocalEmbedder,
    passages: Vec<(String, Vec<f32>)>,
    top_k: usize,
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl MemoryVectorStore {
    pub fn new(top_k: usize) -> Self {
        Self {
            embedder: LocalEmbedder::new(256),
            passages: Vec::new(),
            top_k: top_k.max(1),
        }
    }

    pub fn from_fixture(fixture: &Fixture, top_k: usize) -> Self {
        let mut store = Self::new(top_k);
        for passage in &fixture.passages {
            store.add_passage(passage);
        }
        store
    }

    /// Index a passage. Whitespace-only text is ignored.
    pub fn add_passage(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let embedding = self.embedder.embed(text);
        self.passages.push((text.to_string(), embedding));
        true
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl VectorSearch for MemoryVectorStore {
    async fn similarity_search(&self, query: &str) -> Result<Vec<String>> {
        let query_embedding = self.embedder.embed(query);

        let mut scored: Vec<(f32, &str)> = self
            .passages
            .iter()
            .map(|(text, embedding)| (cosine_similarity(&query_embedding, embedding), text.as_str()))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        Ok(scored.into_iter().map(|(_, text)| text.to_string()).collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}
