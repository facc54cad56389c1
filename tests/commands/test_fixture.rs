//! Tests for the bundled offline fixture

use std::path::PathBuf;

use graph_rag::commands::backend::fixture_stores;
use graph_rag::commands::graph::format_edges;
use graph_rag::config::MENTIONS_RELATION;
use graph_rag::rag::{build_full_text_query, GraphStore, VectorSearch};
use graph_rag::Config;

fn tudors_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/tudors.json")
}

#[test]
fn test_fixture_graph_preview_skips_mentions() {
    let (graph, _) = fixture_stores(&Config::default(), &tudors_fixture()).unwrap();

    let preview = format_edges(graph.sample_relationships(MENTIONS_RELATION, 50));
    assert!(preview.contains("Elizabeth I - BELONGS_TO -> House Of Tudor\n"));
    assert!(!preview.contains(MENTIONS_RELATION));
}

#[tokio::test]
async fn test_fixture_stores_answer_retrieval_calls() {
    let config = Config::default();
    let (graph, vectors) = fixture_stores(&config, &tudors_fixture()).unwrap();

    let query = build_full_text_query("Elizabeth").unwrap();
    let nodes = graph
        .query_full_text(&config.retrieval.fulltext_index, &query, 2)
        .await
        .unwrap();
    assert_eq!(nodes[0].name, "Elizabeth I");

    let passages = vectors
        .similarity_search("When was Elizabeth born?")
        .await
        .unwrap();
    assert!(!passages.is_empty());
    assert!(passages.len() <= config.vector.top_k);
}
