//! OpenAI-compatible chat completions client.
//!
//! Works against any host that speaks the `/chat/completions` protocol
//! (OpenAI, Groq, local gateways) via the configurable base URL.

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::OpenAISettings;
use crate::prompts::render_template;
use crate::rag::store::{StructuredExtractionModel, TextGenerationModel};
use crate::{Error, Result};

/// Identifying information about entities.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Entities {
    /// All the person, organization, or business entities that appear in the text
    pub names: Vec<String>,
}

/// `response_format` asking for an [`Entities`] object.
pub fn entities_response_format() -> Result<Value> {
    let mut schema = serde_json::to_value(schemars::schema_for!(Entities))?;
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    Ok(json!({
        "type": "json_schema",
        "json_schema": {
            "name": "Entities",
            "schema": schema,
        }
    }))
}

/// OpenAI client.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create client from settings.
    pub fn new(settings: &OpenAISettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("graph_rag/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("HTTP client error: {}", e)))?;

        Self::with_http(
            http,
            settings.api_key.clone(),
            settings.base_url.clone(),
            settings.model.clone(),
            settings.temperature,
            settings.max_tokens,
        )
    }

    fn with_http(
        http: Client,
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidArgument("OPENAI_API_KEY is empty".to_string()));
        }

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
            max_tokens,
        })
    }

    /// Chat completion.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        response_format: Option<Value>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format,
        };

        debug!("POST {}/chat/completions ({})", self.base_url, self.model);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::OpenAiError(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::OpenAiError(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::OpenAiError(format!("status {}: {}", status, text)));
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::OpenAiError(format!("invalid response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::OpenAiError("empty response".to_string()))
    }
}

#[async_trait]
impl TextGenerationModel for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat_completion(vec![ChatMessage::user(prompt)], None)
            .await
    }
}

#[async_trait]
impl StructuredExtractionModel for OpenAIClient {
    async fn extract(
        &self,
        system: &str,
        instruction: &str,
        question: &str,
    ) -> Result<Vec<String>> {
        let user = render_template(instruction, &[("question", question)]);
        let content = self
            .chat_completion(
                vec![ChatMessage::system(system), ChatMessage::user(&user)],
                Some(entities_response_format()?),
            )
            .await
            .map_err(|e| Error::Extraction(e.to_string()))?;

        let entities: Entities = serde_json::from_str(&content)
            .map_err(|e| Error::Extraction(format!("undecodable entities: {}", e)))?;

        Ok(entities.names)
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.to_string()),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
