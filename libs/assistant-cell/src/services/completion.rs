use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::AssistantError;

const SYSTEM_PROMPT: &str =
    "Tu es Khodia, un assistant médical de la clinique Bienêtre. Réponds toujours en français.";

/// Capability behind the free-form chat fallback: a prompt in, an
/// answer out. Swapped for a stub in tests.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Client for any OpenAI-compatible chat completion endpoint.
pub struct OpenAiCompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    configured: bool,
}

impl OpenAiCompletionClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.assistant_api_url.clone(),
            api_key: config.assistant_api_key.clone(),
            model: config.assistant_model.clone(),
            configured: config.is_assistant_configured(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[async_trait]
impl ChatCompletion for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        if !self.configured {
            return Err(AssistantError::NotConfigured);
        }

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting completion from {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt }
                ],
                "max_tokens": 500,
                "temperature": 0.7
            }))
            .send()
            .await
            .map_err(|e| AssistantError::Completion(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Completion(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Completion(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AssistantError::Completion("empty completion response".to_string()))
    }
}
