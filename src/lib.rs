//! Graph-augmented question answering.
//!
//! This library provides tools to:
//! - Rewrite follow-up questions into standalone ones using chat history
//! - Look up entity neighbourhoods in a Neo4j knowledge graph (fuzzy full-text match)
//! - Retrieve similar passages from Qdrant or a Neo4j vector index
//! - Merge both into one context and generate an answer with an OpenAI-compatible model
//! - Run the whole pipeline offline against in-memory stores

pub mod commands;
pub mod config;
pub mod error;
pub mod integrations;
pub mod metrics;
pub mod prompts;
pub mod rag;
pub mod storage;

// Re-export common types
pub use config::{Config, RetrievalLimits};
pub use error::{Error, Result};
pub use integrations::OpenAIClient;
pub use prompts::Prompt;
pub use rag::{Answer, AnswerPipeline, ChatHistory, ConversationTurn, PipelineDeps};
