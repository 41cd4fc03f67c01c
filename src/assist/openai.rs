//! OpenAI-backed language model and summarizer.

use super::{Availability, LanguageModel, ModelSession, Summarizer};
use crate::error::{MomentsError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for model requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Create an OpenAI client with the default timeout.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

fn api_key_present() -> bool {
    std::env::var("OPENAI_API_KEY").map(|k| !k.is_empty()).unwrap_or(false)
}

async fn complete(
    client: &Client<OpenAIConfig>,
    model: &str,
    system: &str,
    user: &str,
    response_format: Option<ResponseFormat>,
) -> Result<String> {
    let messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| MomentsError::Model(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| MomentsError::Model(e.to_string()))?
            .into(),
    ];

    let mut request = CreateChatCompletionRequestArgs::default();
    request.model(model).messages(messages).temperature(0.2);
    if let Some(format) = response_format {
        request.response_format(format);
    }
    let request = request.build().map_err(|e| MomentsError::Model(e.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e| MomentsError::OpenAI(format!("Chat completion failed: {}", e)))?;

    response
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| MomentsError::Model("Empty response from model".to_string()))
}

/// Chat-completions model with JSON-schema constrained output.
pub struct OpenAiModel {
    model: String,
}

impl OpenAiModel {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn availability(&self) -> Availability {
        if api_key_present() {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    async fn create_session(&self) -> Result<Arc<dyn ModelSession>> {
        if !api_key_present() {
            return Err(MomentsError::Config("OPENAI_API_KEY is not set".to_string()));
        }
        Ok(Arc::new(OpenAiSession {
            client: create_client()?,
            model: self.model.clone(),
        }))
    }
}

struct OpenAiSession {
    client: Client<OpenAIConfig>,
    model: String,
}

#[async_trait]
impl ModelSession for OpenAiSession {
    #[instrument(skip(self, prompt, schema))]
    async fn prompt_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: "response".to_string(),
                schema: Some(schema.clone()),
                strict: Some(true),
            },
        };
        let text = complete(
            &self.client,
            &self.model,
            "You answer with JSON that matches the given schema.",
            prompt,
            Some(format),
        )
        .await?;
        debug!("Model replied with {} chars", text.len());
        Ok(text)
    }
}

/// Short key-point summaries via chat completions.
pub struct OpenAiSummarizer {
    client: Client<OpenAIConfig>,
    model: String,
    instruction: String,
}

impl OpenAiSummarizer {
    /// `None` when no API key is configured.
    pub fn new(model: &str, instruction: &str) -> Result<Option<Self>> {
        if !api_key_present() {
            return Ok(None);
        }
        Ok(Some(Self {
            client: create_client()?,
            model: model.to_string(),
            instruction: instruction.to_string(),
        }))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        complete(&self.client, &self.model, &self.instruction, text, None).await
    }
}
