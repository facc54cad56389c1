//! Integration tests for the graph_rag library
//!
//! These tests drive the public pipeline over in-memory stores and
//! recording language-model doubles.

mod commands;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use graph_rag::{
    config::{RetrievalLimits, MENTIONS_RELATION},
    error::{Error, Result},
    prompts::{list_prompts, Prompt},
    rag::{
        build_full_text_query, AnswerPipeline, ConversationTurn, Degradation, GraphEdge,
        GraphStore, MatchedNode, MemoryGraph, MemoryVectorStore, PipelineDeps,
        StructuredExtractionModel, TextGenerationModel, VectorSearch,
    },
};

const ELIZABETH_QUESTION: &str = "Which house did Elizabeth I belong to?";
const TUDOR_PASSAGE: &str =
    "Elizabeth I was the last monarch of the House of Tudor, reigning until 1603.";
const REWRITTEN: &str = "When was Elizabeth I born?";

// ============================================================================
// Test doubles
// ============================================================================

/// Language model that records every call.
#[derive(Default)]
struct RecordingLlm {
    extract_questions: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    fn answer_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.ends_with("Answer:"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StructuredExtractionModel for RecordingLlm {
    async fn extract(&self, _system: &str, _instruction: &str, question: &str) -> Result<Vec<String>> {
        self.extract_questions
            .lock()
            .unwrap()
            .push(question.to_string());
        Ok(vec!["Elizabeth I".to_string()])
    }
}

#[async_trait]
impl TextGenerationModel for RecordingLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.ends_with("Standalone question:") {
            Ok(REWRITTEN.to_string())
        } else {
            Ok("House Of Tudor".to_string())
        }
    }
}

/// Vector store that records the queries it receives.
struct RecordingVectors {
    inner: MemoryVectorStore,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl VectorSearch for RecordingVectors {
    async fn similarity_search(&self, query: &str) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.inner.similarity_search(query).await
    }
}

/// Graph whose full-text lookups always fail.
struct BrokenGraph;

#[async_trait]
impl GraphStore for BrokenGraph {
    async fn query_full_text(&self, _: &str, _: &str, _: usize) -> Result<Vec<MatchedNode>> {
        Err(Error::GraphStore("connection refused".to_string()))
    }

    async fn traverse_neighbors(&self, _: &MatchedNode, _: &str, _: usize) -> Result<Vec<GraphEdge>> {
        Ok(Vec::new())
    }
}

fn tudor_graph() -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    graph.add_relationship("Elizabeth I", "BELONGS_TO", "House Of Tudor");
    graph.add_relationship("Document 1", MENTIONS_RELATION, "Elizabeth I");
    graph
}

fn tudor_vectors() -> Arc<RecordingVectors> {
    let mut inner = MemoryVectorStore::new(4);
    inner.add_passage(TUDOR_PASSAGE);
    Arc::new(RecordingVectors {
        inner,
        queries: Mutex::new(Vec::new()),
    })
}

fn pipeline(
    graph: Arc<dyn GraphStore>,
    vectors: Arc<RecordingVectors>,
    llm: Arc<RecordingLlm>,
) -> AnswerPipeline {
    AnswerPipeline::new(
        PipelineDeps::with_llm(graph, vectors, llm),
        RetrievalLimits::default(),
    )
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test]
async fn test_answer_context_has_graph_line_and_passage() {
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(Arc::new(tudor_graph()), tudor_vectors(), llm.clone());

    let answer = pipeline
        .answer_with_context(ELIZABETH_QUESTION, &[])
        .await
        .unwrap();

    let context = answer.context.as_str();
    let (structured, unstructured) = context
        .split_once("Unstructured data:\n")
        .expect("two sections");
    assert!(structured.contains("Elizabeth I - BELONGS_TO -> House Of Tudor"));
    assert!(!structured.contains(MENTIONS_RELATION));
    assert!(unstructured.contains(TUDOR_PASSAGE));

    assert_eq!(answer.text, "House Of Tudor");
    assert_eq!(answer.standalone_question, ELIZABETH_QUESTION);
    assert!(answer.degraded.is_empty());

    // No history: nothing was rewritten.
    assert!(llm
        .prompts
        .lock()
        .unwrap()
        .iter()
        .all(|p| !p.ends_with("Standalone question:")));
}

#[tokio::test]
async fn test_follow_up_rewrite_flows_into_retrieval() {
    let llm = Arc::new(RecordingLlm::default());
    let vectors = tudor_vectors();
    let pipeline = pipeline(Arc::new(tudor_graph()), vectors.clone(), llm.clone());
    let history = vec![ConversationTurn::new(ELIZABETH_QUESTION, "House Of Tudor")];

    let answer = pipeline
        .answer_with_context("When was she born?", &history)
        .await
        .unwrap();

    assert_eq!(answer.standalone_question, REWRITTEN);
    assert_eq!(*llm.extract_questions.lock().unwrap(), vec![REWRITTEN.to_string()]);
    assert_eq!(*vectors.queries.lock().unwrap(), vec![REWRITTEN.to_string()]);

    let answer_prompts = llm.answer_prompts();
    assert_eq!(answer_prompts.len(), 1);
    assert!(answer_prompts[0].contains(&format!("Question: {}", REWRITTEN)));
}

#[tokio::test]
async fn test_graph_failure_degrades_to_passages() {
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(Arc::new(BrokenGraph), tudor_vectors(), llm);

    let answer = pipeline
        .answer_with_context(ELIZABETH_QUESTION, &[])
        .await
        .unwrap();

    assert_eq!(answer.degraded, vec![Degradation::GraphRetrieval]);
    assert!(answer
        .context
        .as_str()
        .starts_with("Structured data:\n\nUnstructured data:\n"));
    assert!(answer.context.as_str().contains(TUDOR_PASSAGE));
    assert_eq!(answer.text, "House Of Tudor");
}

#[tokio::test]
async fn test_missing_fulltext_index_is_reported() {
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(
        Arc::new(MemoryGraph::without_fulltext_index()),
        tudor_vectors(),
        llm,
    );

    let err = pipeline
        .answer(ELIZABETH_QUESTION, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)));
}

#[tokio::test]
async fn test_answer_returns_only_text() {
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(Arc::new(tudor_graph()), tudor_vectors(), llm);

    let text = pipeline.answer(ELIZABETH_QUESTION, &[]).await.unwrap();
    assert_eq!(text, "House Of Tudor");
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let llm = Arc::new(RecordingLlm::default());
    let pipeline = pipeline(Arc::new(tudor_graph()), tudor_vectors(), llm.clone());

    let err = pipeline.answer("   ", &[]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(llm.prompts.lock().unwrap().is_empty());
}

// ============================================================================
// Full-text query tests
// ============================================================================

#[test]
fn test_full_text_query_examples() {
    assert_eq!(
        build_full_text_query("Elizabeth I").unwrap(),
        "Elizabeth~2 AND I~2"
    );
    assert_eq!(build_full_text_query("Tudor").unwrap(), "Tudor~2");
}

#[test]
fn test_full_text_query_reserved_only_is_empty_input() {
    assert!(matches!(
        build_full_text_query("&& || !"),
        Err(Error::EmptyInput(_))
    ));
}

#[tokio::test]
async fn test_memory_graph_answers_built_queries() {
    let graph = tudor_graph();
    let query = build_full_text_query("Elizabeth I").unwrap();

    let nodes = graph.query_full_text("entity", &query, 2).await.unwrap();
    assert_eq!(nodes[0].name, "Elizabeth I");
}

// ============================================================================
// Prompt Tests
// ============================================================================

#[test]
fn test_list_prompts_in_pipeline_order() {
    let names: Vec<&str> = list_prompts().iter().map(|p| p.name()).collect();
    assert_eq!(
        names,
        vec!["entity_system", "entity_instruction", "condense_question", "answer"]
    );
}

#[test]
fn test_answer_prompt_renders_context_and_question() {
    let rendered = Prompt::Answer.render(&[
        ("context", "Structured data:\nA - R -> B\n"),
        ("question", "What is A?"),
    ]);
    assert!(rendered.contains("A - R -> B"));
    assert!(rendered.contains("Question: What is A?"));
    assert!(rendered.ends_with("Answer:"));
}
