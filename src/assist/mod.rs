//! Optional generative assistance: emotion labels, window picks and titles.
//!
//! Every capability here is optional. [`Assistant`] wraps whatever is
//! available and falls back to deterministic heuristics, so callers never
//! see an error from this layer.

mod adapter;
mod openai;

pub use adapter::{safe_json_from_text, Assistant, Classification, WindowCandidate, WindowPick};
pub use openai::{create_client, create_client_with_timeout, OpenAiModel, OpenAiSummarizer};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Whether a language model can be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

/// A structured-generation capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn availability(&self) -> Availability;
    async fn create_session(&self) -> Result<Arc<dyn ModelSession>>;
}

/// An open session that answers prompts constrained by a JSON schema.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Returns raw response text, expected to contain JSON.
    async fn prompt_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

/// A summarization capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Model that is never available.
pub struct Unavailable;

#[async_trait]
impl LanguageModel for Unavailable {
    async fn availability(&self) -> Availability {
        Availability::Unavailable
    }

    async fn create_session(&self) -> Result<Arc<dyn ModelSession>> {
        Err(crate::error::MomentsError::Model("No language model configured".to_string()))
    }
}

/// Open a session unless the model is unavailable or session creation fails.
pub async fn ensure_session(model: &dyn LanguageModel) -> Option<Arc<dyn ModelSession>> {
    if model.availability().await == Availability::Unavailable {
        return None;
    }
    match model.create_session().await {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("Language model session unavailable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_model_has_no_session() {
        assert!(ensure_session(&Unavailable).await.is_none());
    }
}
