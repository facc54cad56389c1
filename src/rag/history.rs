//! Follow-up question rewriting against prior conversation turns.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::TextGenerationModel;
use crate::prompts::Prompt;
use crate::{Error, Result};

/// One exchange: what the user asked and what was answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConversationTurn {
    pub human: String,
    pub ai: String,
}

impl ConversationTurn {
    pub fn new(human: impl Into<String>, ai: impl Into<String>) -> Self {
        Self {
            human: human.into(),
            ai: ai.into(),
        }
    }
}

impl From<(String, String)> for ConversationTurn {
    fn from((human, ai): (String, String)) -> Self {
        Self { human, ai }
    }
}

impl From<ConversationTurn> for (String, String) {
    fn from(turn: ConversationTurn) -> Self {
        (turn.human, turn.ai)
    }
}

/// Chronological conversation, owned by the caller.
pub type ChatHistory = Vec<ConversationTurn>;

/// Which way a question goes through the condenser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondenseRoute<'a> {
    /// No prior turns: the question is already standalone.
    NoHistory,
    /// Prior turns exist: the question is rewritten by the model.
    HasHistory(&'a [ConversationTurn]),
}

impl<'a> CondenseRoute<'a> {
    pub fn select(history: &'a [ConversationTurn]) -> Self {
        if history.is_empty() {
            CondenseRoute::NoHistory
        } else {
            CondenseRoute::HasHistory(history)
        }
    }
}

/// Render turns as alternating `Human:` / `Assistant:` lines.
pub fn format_chat_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.human, turn.ai))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns a follow-up into a question that stands on its own.
#[derive(Clone)]
pub struct HistoryCondenser {
    model: Arc<dyn TextGenerationModel>,
}

impl std::fmt::Debug for HistoryCondenser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCondenser").finish_non_exhaustive()
    }
}

impl HistoryCondenser {
    pub fn new(model: Arc<dyn TextGenerationModel>) -> Self {
        Self { model }
    }

    /// Return `question` unchanged without history, otherwise the model's
    /// rewrite verbatim. Model failure or blank output is
    /// [`Error::Condensation`].
    pub async fn condense(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
        match CondenseRoute::select(history) {
            CondenseRoute::NoHistory => Ok(question.to_string()),
            CondenseRoute::HasHistory(turns) => {
                let chat_history = format_chat_history(turns);
                let prompt = Prompt::CondenseQuestion.render(&[
                    ("chat_history", chat_history.as_str()),
                    ("question", question),
                ]);
                debug!("Condensing follow-up against {} turns", turns.len());

                let rewritten = self
                    .model
                    .generate(&prompt)
                    .await
                    .map_err(|e| Error::Condensation(e.to_string()))?;

                if rewritten.trim().is_empty() {
                    return Err(Error::Condensation(
                        "model returned an empty question".to_string(),
                    ));
                }

                info!("Standalone question: {}", rewritten);
                Ok(rewritten)
            }
        }
    }
}
