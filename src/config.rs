//! Configuration for graph, vector and language-model backends
//!
//! Loads configuration from config.yml; environment variables take precedence.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Name of the full-text index over `__Entity__.id`.
pub const DEFAULT_FULLTEXT_INDEX: &str = "entity";
/// Full-text matches kept per extracted entity.
pub const DEFAULT_FULLTEXT_MATCHES: usize = 2;
/// Relationship lines kept per extracted entity.
pub const DEFAULT_NEIGHBOR_LIMIT: usize = 50;
/// Passages returned by similarity search.
pub const DEFAULT_TOP_K: usize = 4;
/// Relationship type linking documents to the entities they mention.
pub const MENTIONS_RELATION: &str = "MENTIONS";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Name of the full-text index over `Document.text` used by hybrid search.
pub const DEFAULT_KEYWORD_INDEX: &str = "keyword";

/// Which backend answers similarity searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Qdrant,
    Neo4j,
}

/// How the Neo4j backend ranks passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Embedding similarity only
    Vector,
    /// Embedding similarity merged with keyword matches on the passage text
    #[default]
    Hybrid,
}

/// Per-request traversal bounds handed to the graph collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalLimits {
    pub fulltext_index: String,
    pub fulltext_matches: usize,
    pub neighbor_limit: usize,
    pub exclude_relation: String,
    pub dedupe_entities: bool,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            fulltext_index: DEFAULT_FULLTEXT_INDEX.to_string(),
            fulltext_matches: DEFAULT_FULLTEXT_MATCHES,
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
            exclude_relation: MENTIONS_RELATION.to_string(),
            dedupe_entities: false,
        }
    }
}

/// Neo4j connection.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub uri: String,
    pub username: String,
    pub password: String,
}

/// Vector store connection.
#[derive(Debug, Clone)]
pub struct VectorSettings {
    pub backend: VectorBackend,
    pub url: String,
    pub collection: String,
    pub index: String,
    /// Full-text index over passage text, used when `search_type` is hybrid
    pub keyword_index: String,
    pub search_type: SearchType,
    pub top_k: usize,
}

/// OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    neo4j: Option<Neo4jYaml>,
    vector: Option<VectorYaml>,
    openai: Option<OpenAIYaml>,
    retrieval: Option<RetrievalYaml>,
}

#[derive(Debug, Default, Deserialize)]
struct Neo4jYaml {
    uri: Option<String>,
    username: Option<String>,
    password: Option<String>,
    fulltext_index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VectorYaml {
    backend: Option<VectorBackend>,
    url: Option<String>,
    collection: Option<String>,
    index: Option<String>,
    keyword_index: Option<String>,
    search_type: Option<SearchType>,
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIYaml {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    embedding_model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalYaml {
    fulltext_matches: Option<usize>,
    neighbor_limit: Option<usize>,
    dedupe_entities: Option<bool>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub graph: GraphSettings,
    pub vector: VectorSettings,
    pub openai: OpenAISettings,
    pub retrieval: RetrievalLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults.
    /// Environment variables take precedence over config.yml values.
    pub fn new() -> Self {
        for path in ["config.yml", "../config.yml"] {
            if !Path::new(path).exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring {}: {}", path, e),
            }
        }
        Self::from_yaml(YamlConfig::default())
    }

    /// Resolve a value: `${VAR}` placeholders read the named variable, and
    /// an explicit `env_key` overrides whatever the file said.
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        match value {
            Some(v) if v.starts_with("${") && v.ends_with('}') => {
                std::env::var(&v[2..v.len() - 1]).ok()
            }
            other => other,
        }
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let neo4j = yaml.neo4j.unwrap_or_default();
        let vector = yaml.vector.unwrap_or_default();
        let openai = yaml.openai.unwrap_or_default();
        let retrieval = yaml.retrieval.unwrap_or_default();

        let graph = GraphSettings {
            uri: Self::resolve_env_string(neo4j.uri, "NEO4J_URI")
                .unwrap_or_else(|| "bolt://localhost:7687".to_string()),
            username: Self::resolve_env_string(neo4j.username, "NEO4J_USERNAME")
                .unwrap_or_else(|| "neo4j".to_string()),
            password: Self::resolve_env_string(neo4j.password, "NEO4J_PASSWORD")
                .unwrap_or_default(),
        };

        let vector = VectorSettings {
            backend: vector.backend.unwrap_or(VectorBackend::Qdrant),
            url: Self::resolve_env_string(vector.url, "QDRANT_URL")
                .unwrap_or_else(|| "http://localhost:6334".to_string()),
            collection: vector.collection.unwrap_or_else(|| "documents".to_string()),
            index: vector.index.unwrap_or_else(|| "vector".to_string()),
            keyword_index: vector
                .keyword_index
                .unwrap_or_else(|| DEFAULT_KEYWORD_INDEX.to_string()),
            search_type: vector.search_type.unwrap_or_default(),
            top_k: vector.top_k.unwrap_or(DEFAULT_TOP_K).max(1),
        };

        let openai = OpenAISettings {
            api_key: Self::resolve_env_string(openai.api_key, "OPENAI_API_KEY")
                .unwrap_or_default(),
            base_url: Self::resolve_env_string(openai.base_url, "OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: openai.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: openai
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            temperature: openai.temperature.unwrap_or(0.0),
            max_tokens: openai.max_tokens.unwrap_or(512),
            timeout: Duration::from_secs(openai.timeout_secs.unwrap_or(60)),
        };

        let retrieval = RetrievalLimits {
            fulltext_index: neo4j
                .fulltext_index
                .unwrap_or_else(|| DEFAULT_FULLTEXT_INDEX.to_string()),
            fulltext_matches: retrieval
                .fulltext_matches
                .unwrap_or(DEFAULT_FULLTEXT_MATCHES),
            neighbor_limit: retrieval.neighbor_limit.unwrap_or(DEFAULT_NEIGHBOR_LIMIT),
            exclude_relation: MENTIONS_RELATION.to_string(),
            dedupe_entities: retrieval.dedupe_entities.unwrap_or(false),
        };

        Self {
            graph,
            vector,
            openai,
            retrieval,
        }
    }
}
