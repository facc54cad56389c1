//! Interactive conversation on stdin.
//!
//! This command owns the chat history: each answered turn is appended here,
//! the pipeline only reads it.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use super::ask::render_answer;
use super::backend::build_pipeline;
use crate::config::Config;
use crate::rag::{AnswerPipeline, ChatHistory, ConversationTurn};

const PROMPT: &str = "> ";

fn is_exit(line: &str) -> bool {
    matches!(line, "exit" | "quit" | ":q")
}

/// Answer each input line in turn until EOF or `exit`. Returns the history.
pub async fn converse<R, W>(
    pipeline: &AnswerPipeline,
    input: R,
    out: &mut W,
    show_context: bool,
) -> Result<ChatHistory>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut history = ChatHistory::new();
    let mut lines = input.lines();

    write!(out, "{}", PROMPT)?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if is_exit(question) {
            break;
        }
        if question.is_empty() {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
            continue;
        }

        match pipeline.answer_with_context(question, &history).await {
            Ok(answer) => {
                write!(out, "{}", render_answer(&answer, show_context))?;
                history.push(ConversationTurn::new(question, answer.text));
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!("Question failed: {}", err);
                writeln!(out, "error: {}", err)?;
            }
        }

        write!(out, "{}", PROMPT)?;
        out.flush()?;
    }

    Ok(history)
}

pub async fn run(config: &Config, show_context: bool, offline: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config, offline).await?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let history = converse(&pipeline, stdin, &mut stdout, show_context).await?;
    writeln!(stdout)?;
    tracing::info!("Conversation ended after {} turns", history.len());
    Ok(())
}
