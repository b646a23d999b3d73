//! Ollama local model provider.
//!
//! Connects to a locally running Ollama server. No API key required.

use async_trait::async_trait;
use aipm_core::{
    completion::{Completion, CompletionMetadata},
    context::Context,
    error::AipmError,
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Ollama provider backed by a local server.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create from config values.
    pub fn from_config(base_url: String, model: String, timeout_secs: u64) -> Result<Self, AipmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AipmError::Provider(format!("ollama: failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            model,
        })
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct OllamaChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaChatMessage>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
}

fn build_request(model: &str, context: &Context) -> OllamaChatRequest {
    OllamaChatRequest {
        model: model.to_string(),
        messages: context
            .to_api_messages()
            .into_iter()
            .map(|m| OllamaChatMessage {
                role: m.role,
                content: Some(m.content),
            })
            .collect(),
        stream: false,
        options: context
            .temperature
            .map(|temperature| OllamaOptions { temperature }),
    }
}

fn total_tokens(resp: &OllamaChatResponse) -> Option<u64> {
    match (resp.eval_count, resp.prompt_eval_count) {
        (Some(e), Some(p)) => Some(e + p),
        (Some(e), None) => Some(e),
        _ => None,
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn requires_api_key(&self) -> bool {
        false
    }

    async fn complete(&self, context: &Context) -> Result<Completion, AipmError> {
        let effective_model = context.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let start = Instant::now();

        let body = build_request(effective_model, context);
        debug!("ollama: POST {url} model={effective_model}");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AipmError::Provider(format!("ollama request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AipmError::Provider(format!(
                "ollama returned {status}: {text}"
            )));
        }

        let parsed: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| AipmError::Provider(format!("ollama: failed to parse response: {e}")))?;

        let tokens = total_tokens(&parsed);
        let text = parsed
            .message
            .and_then(|m| m.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AipmError::Provider("ollama returned no completion".to_string()))?;

        Ok(Completion {
            text,
            metadata: CompletionMetadata {
                provider_used: "ollama".to_string(),
                tokens_used: tokens,
                processing_time_ms: start.elapsed().as_millis() as u64,
                model: parsed.model,
            },
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("ollama not available: {e}");
                false
            }
        }
    }
}
