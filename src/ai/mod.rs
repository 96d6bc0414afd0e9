//! Hosted text-generation collaborator
//!
//! The collaborator is an opaque prompt-in, text-out service. It is constructed
//! once at startup and handed to the server state as an `Arc<dyn TextGenerator>`.

pub mod gemini;
pub mod prompts;
pub mod response;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::AiConfig;
use crate::errors::AiServiceError;

pub use gemini::GeminiClient;
pub use prompts::{render as render_prompt, Prompt};
pub use response::{parse_json_response, strip_json_fences};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiServiceError>;
}

/// Stand-in used when no API key is configured; every call fails.
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, AiServiceError> {
        Err(AiServiceError::NotConfigured)
    }
}

pub fn build_generator(config: &AiConfig) -> Arc<dyn TextGenerator> {
    if !config.is_configured() {
        warn!("No AI API key configured; AI endpoints will return upstream errors");
        return Arc::new(UnconfiguredGenerator);
    }

    match GeminiClient::new(config) {
        Ok(client) => {
            info!("AI collaborator configured with model {}", config.model);
            Arc::new(client)
        }
        Err(err) => {
            warn!("Failed to initialise AI client: {}", err);
            Arc::new(UnconfiguredGenerator)
        }
    }
}
