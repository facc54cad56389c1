//! One-shot question answering.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::backend::build_pipeline;
use crate::config::Config;
use crate::rag::{Answer, ChatHistory, Degradation};

/// Options for `ask`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub question: String,
    /// JSON array of `[human, ai]` pairs
    pub history: Option<PathBuf>,
    pub show_context: bool,
}

/// Read a conversation saved as `[[human, ai], ...]`.
pub fn load_history(path: &Path) -> Result<ChatHistory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid history file {}", path.display()))
}

fn degradation_note(stage: &Degradation) -> &'static str {
    match stage {
        Degradation::Condensation => "follow-up rewrite failed, used the question as asked",
        Degradation::GraphRetrieval => "graph lookup failed, answered from passages only",
        Degradation::VectorRetrieval => "passage search failed, answered from the graph only",
    }
}

/// Text printed for an answer.
pub fn render_answer(answer: &Answer, show_context: bool) -> String {
    let mut out = answer.text.trim_end().to_string();
    out.push('\n');

    for stage in &answer.degraded {
        out.push_str(&format!("[note] {}\n", degradation_note(stage)));
    }

    if show_context {
        out.push_str("\n--- context ---\n");
        out.push_str(answer.context.as_str());
    }
    out
}

/// Answer `options.question`, from `offline` fixture stores when given.
pub async fn run(config: &Config, options: AskOptions, offline: Option<&Path>) -> Result<()> {
    let history = match &options.history {
        Some(path) => load_history(path)?,
        None => ChatHistory::new(),
    };

    let pipeline = build_pipeline(config, offline).await?;
    let answer = pipeline
        .answer_with_context(&options.question, &history)
        .await?;

    print!("{}", render_answer(&answer, options.show_context));
    Ok(())
}
