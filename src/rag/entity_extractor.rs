//! Entity name extraction from a question, via a structured-output model call.

use std::sync::Arc;

use tracing::debug;

use super::store::StructuredExtractionModel;
use crate::prompts::Prompt;
use crate::Result;

/// Pulls person and organization names out of a question.
///
/// Inference is delegated to a [`StructuredExtractionModel`]; this type owns
/// the prompt pair and the shape of the result.
#[derive(Clone)]
pub struct EntityExtractor {
    model: Arc<dyn StructuredExtractionModel>,
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor").finish_non_exhaustive()
    }
}

impl EntityExtractor {
    pub fn new(model: Arc<dyn StructuredExtractionModel>) -> Self {
        Self { model }
    }

    /// Extract entity names in model order. Duplicates are kept; blank
    /// names are dropped. An empty result means no entities were found.
    pub async fn extract(&self, question: &str) -> Result<Vec<String>> {
        let names = self
            .model
            .extract(
                Prompt::EntitySystem.template(),
                Prompt::EntityInstruction.template(),
                question,
            )
            .await?;

        let names: Vec<String> = names
            .into_iter()
            .filter(|name| !name.trim().is_empty())
            .collect();

        debug!("Extracted {} entities: {:?}", names.len(), names);
        Ok(names)
    }
}
