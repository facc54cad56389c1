//! Tests for ask command helpers

use std::io::Write;

use graph_rag::commands::ask::{load_history, render_answer};
use graph_rag::rag::{Answer, ContextAssembler, Degradation, StructuredContext};

#[test]
fn test_history_file_round_trips_into_turns() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            ["Which house did Elizabeth I belong to?", "House Of Tudor"],
            ["Who was her father?", "Henry VIII"]
        ]"#
    )
    .unwrap();

    let history = load_history(file.path()).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].human, "Who was her father?");
    assert_eq!(history[1].ai, "Henry VIII");
}

#[test]
fn test_missing_history_file_is_error() {
    let err = load_history(std::path::Path::new("/nonexistent/history.json")).unwrap_err();
    assert!(err.to_string().contains("failed to read history"));
}

#[test]
fn test_render_answer_lists_every_degradation() {
    let answer = Answer {
        text: "Greenwich Palace".to_string(),
        standalone_question: "Where was Elizabeth I born?".to_string(),
        context: ContextAssembler::new().assemble(&StructuredContext::default(), &[]),
        degraded: vec![Degradation::Condensation, Degradation::VectorRetrieval],
    };

    let out = render_answer(&answer, false);
    assert_eq!(out.matches("[note]").count(), 2);
    assert!(!out.contains("--- context ---"));
}
