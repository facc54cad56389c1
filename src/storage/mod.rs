//! External stores: Neo4j graph, vector search backends, embeddings.

pub mod embeddings;
pub mod graph_db;
pub mod neo4j_vector;
pub mod vector_db;

pub use embeddings::{Embedder, EmbeddingService};
pub use graph_db::Neo4jGraphStore;
pub use neo4j_vector::Neo4jVectorStore;
pub use vector_db::QdrantVectorStore;
