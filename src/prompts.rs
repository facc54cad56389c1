//! Fixed prompt templates used by the pipeline.
//!
//! Templates use `{name}` placeholders filled by [`Prompt::render`].

/// Available prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// System role for entity extraction.
    EntitySystem,
    /// Human instruction for entity extraction (`{question}`).
    EntityInstruction,
    /// Follow-up rewrite (`{chat_history}`, `{question}`).
    CondenseQuestion,
    /// Final answer over retrieved context (`{context}`, `{question}`).
    Answer,
}

const ENTITY_SYSTEM: &str =
    "You are extracting organization and person entities from the text.";

const ENTITY_INSTRUCTION: &str =
    "Use the given format to extract information from the following input: {question}";

const CONDENSE_QUESTION: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.
Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

const ANSWER: &str = "Answer the question based only on the following context:
{context}

Question: {question}
Use natural language and be concise.
Answer:";

impl Prompt {
    /// Short identifier, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Prompt::EntitySystem => "entity_system",
            Prompt::EntityInstruction => "entity_instruction",
            Prompt::CondenseQuestion => "condense_question",
            Prompt::Answer => "answer",
        }
    }

    /// Raw template text.
    pub fn template(&self) -> &'static str {
        match self {
            Prompt::EntitySystem => ENTITY_SYSTEM,
            Prompt::EntityInstruction => ENTITY_INSTRUCTION,
            Prompt::CondenseQuestion => CONDENSE_QUESTION,
            Prompt::Answer => ANSWER,
        }
    }

    /// Fill this prompt's placeholders. See [`render_template`].
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        render_template(self.template(), vars)
    }
}

/// Substitute `{key}` placeholders in one pass. Unknown keys are left in
/// place and substituted values are never re-scanned.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let key = &after[..close];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// All prompts, in pipeline order.
pub fn list_prompts() -> Vec<Prompt> {
    vec![
        Prompt::EntitySystem,
        Prompt::EntityInstruction,
        Prompt::CondenseQuestion,
        Prompt::Answer,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_prompts() {
        assert_eq!(list_prompts().len(), 4);
    }

    #[test]
    fn test_prompt_names_unique() {
        let mut names: Vec<_> = list_prompts().iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_render_answer() {
        let rendered = Prompt::Answer.render(&[("context", "CTX"), ("question", "Q?")]);
        assert!(rendered.contains("based only on the following context:\nCTX\n"));
        assert!(rendered.contains("Question: Q?"));
        assert!(!rendered.contains('{'));
    }

    #[test]
    fn test_render_condense_keeps_language_instruction() {
        let rendered = Prompt::CondenseQuestion.render(&[
            ("chat_history", "Human: hi\nAssistant: hello"),
            ("question", "and then?"),
        ]);
        assert!(rendered.contains("in its original language"));
        assert!(rendered.contains("Chat History:\nHuman: hi\nAssistant: hello"));
        assert!(rendered.ends_with("Follow Up Input: and then?\nStandalone question:"));
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let rendered = Prompt::Answer.render(&[("context", "{question}"), ("question", "Q?")]);
        assert!(rendered.contains("context:\n{question}\n"));
        assert!(rendered.contains("Question: Q?"));
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let rendered = Prompt::EntityInstruction.render(&[("other", "x")]);
        assert!(rendered.contains("{question}"));
    }
}
