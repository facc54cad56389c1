//! Embedding generation for vector lookups.

use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client as OpenAIClient,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::OpenAISettings;
use crate::{Error, Result};

/// Longest input (in characters) sent to the embeddings endpoint.
const MAX_INPUT_CHARS: usize = 8000;

/// Turns text into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in order. Blank inputs get empty vectors.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::VectorStore("No embedding returned".to_string()))
    }
}

/// OpenAI-compatible embeddings endpoint.
pub struct EmbeddingService {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl EmbeddingService {
    pub fn new(settings: &OpenAISettings) -> Result<Self> {
        if settings.api_key.is_empty() {
            return Err(Error::InvalidArgument("OPENAI_API_KEY not set".to_string()));
        }

        let config = OpenAIConfig::new()
            .with_api_key(settings.api_key.clone())
            .with_api_base(settings.base_url.clone());

        Ok(Self {
            client: OpenAIClient::with_config(config),
            model: settings.embedding_model.clone(),
        })
    }
}

fn prepare_input(text: &str) -> String {
    text.trim().chars().take(MAX_INPUT_CHARS).collect()
}

fn model_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let processed: Vec<String> = texts
            .iter()
            .map(|t| prepare_input(t))
            .filter(|t| !t.is_empty())
            .collect();

        if processed.is_empty() {
            return Ok(vec![Vec::new(); texts.len()]);
        }

        debug!("Generating embeddings for {} texts", processed.len());

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(processed))
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        info!(
            "Generated {} embeddings, tokens used: {}",
            response.data.len(),
            response.usage.total_tokens
        );

        // Map back to original positions (blank texts get empty vectors)
        let mut result = Vec::with_capacity(texts.len());
        let mut embed_iter = response.data.into_iter();

        for text in texts {
            if text.trim().is_empty() {
                result.push(Vec::new());
            } else if let Some(embed) = embed_iter.next() {
                result.push(embed.embedding);
            }
        }

        Ok(result)
    }

    fn dimension(&self) -> usize {
        model_dimension(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(api_key: &str, model: &str) -> OpenAISettings {
        OpenAISettings {
            api_key: api_key.to_string(),
            base_url: "http://localhost:9".to_string(),
            model: "gpt-3.5-turbo-0125".to_string(),
            embedding_model: model.to_string(),
            temperature: 0.0,
            max_tokens: 512,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn dimension_follows_model() {
        let small = EmbeddingService::new(&settings("k", "text-embedding-3-small")).unwrap();
        assert_eq!(small.dimension(), 1536);

        let large = EmbeddingService::new(&settings("k", "text-embedding-3-large")).unwrap();
        assert_eq!(large.dimension(), 3072);
        assert_eq!(large.model, "text-embedding-3-large");

        assert_eq!(model_dimension("text-embedding-ada-002"), 1536);
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = EmbeddingService::new(&settings("", "text-embedding-3-small")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn long_input_is_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_INPUT_CHARS + 10);
        let prepared = prepare_input(&long);
        assert_eq!(prepared.chars().count(), MAX_INPUT_CHARS);
        assert_eq!(prepare_input("  padded  "), "padded");
    }

    #[tokio::test]
    async fn blank_batch_skips_the_network() {
        let service = EmbeddingService::new(&settings("k", "text-embedding-3-small")).unwrap();
        assert!(service.embed_batch(&[]).await.unwrap().is_empty());

        let blanks = service
            .embed_batch(&["   ".to_string(), String::new()])
            .await
            .unwrap();
        assert_eq!(blanks, vec![Vec::<f32>::new(), Vec::new()]);
    }
}
