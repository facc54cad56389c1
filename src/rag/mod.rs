//! Hybrid graph + vector retrieval and answer generation.
//!
//! Flow for one question:
//! 1. [`HistoryCondenser`] rewrites a follow-up into a standalone question
//! 2. graph path: [`EntityExtractor`] -> [`GraphNeighborhoodCollector`]
//! 3. vector path: [`store::VectorSearch`], concurrently with (2)
//! 4. [`ContextAssembler`] merges both, the answer model replies
//!
//! [`AnswerPipeline`] drives the whole thing.

pub mod context;
pub mod entity_extractor;
pub mod fulltext;
pub mod graph;
pub mod history;
pub mod memory;
pub mod pipeline;
pub mod store;

pub use context::{AssembledContext, ContextAssembler, PASSAGE_SEPARATOR};
pub use entity_extractor::EntityExtractor;
pub use fulltext::{build_full_text_query, remove_lucene_chars};
pub use graph::{GraphNeighborhoodCollector, RelationshipLine, StructuredContext};
pub use history::{ChatHistory, CondenseRoute, ConversationTurn, HistoryCondenser};
pub use memory::{Fixture, LocalEmbedder, MemoryGraph, MemoryVectorStore};
pub use pipeline::{Answer, AnswerPipeline, Degradation, PipelineDeps};
pub use store::{
    GraphEdge, GraphStore, MatchedNode, StructuredExtractionModel, TextGenerationModel,
    VectorSearch,
};
