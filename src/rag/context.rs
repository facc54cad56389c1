//! Merges graph and passage retrieval into the prompt context.

use super::graph::StructuredContext;

/// Marker placed between passages so the model can tell them apart.
pub const PASSAGE_SEPARATOR: &str = "#Document ";

/// Context block handed to the answer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext(String);

impl AssembledContext {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AssembledContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats the two retrieval results under fixed headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build the two-section context. No truncation or deduplication.
    pub fn assemble(
        &self,
        structured: &StructuredContext,
        unstructured: &[String],
    ) -> AssembledContext {
        AssembledContext(format!(
            "Structured data:\n{}\nUnstructured data:\n{}\n",
            structured,
            unstructured.join(PASSAGE_SEPARATOR)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::GraphEdge;

    fn structured() -> StructuredContext {
        StructuredContext {
            lines: vec![GraphEdge::new("Elizabeth I", "BELONGS_TO", "House Of Tudor").into()],
        }
    }

    #[test]
    fn sections_in_order() {
        let passages = vec!["first passage".to_string(), "second passage".to_string()];
        let ctx = ContextAssembler::new().assemble(&structured(), &passages);

        assert_eq!(
            ctx.as_str(),
            "Structured data:\nElizabeth I - BELONGS_TO -> House Of Tudor\n\
             Unstructured data:\nfirst passage#Document second passage\n"
        );
    }

    #[test]
    fn assemble_is_deterministic() {
        let passages = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let assembler = ContextAssembler::new();

        let first = assembler.assemble(&structured(), &passages);
        let second = assembler.assemble(&structured(), &passages);

        assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());
    }

    #[test]
    fn empty_inputs_keep_headers() {
        let ctx = ContextAssembler::new().assemble(&StructuredContext::default(), &[]);
        assert_eq!(ctx.to_string(), "Structured data:\n\nUnstructured data:\n\n");
    }

    #[test]
    fn single_passage_has_no_separator() {
        let ctx = ContextAssembler::new()
            .assemble(&StructuredContext::default(), &["only".to_string()]);
        assert!(!ctx.as_str().contains(PASSAGE_SEPARATOR));
        assert!(ctx.into_string().ends_with("Unstructured data:\nonly\n"));
    }
}
