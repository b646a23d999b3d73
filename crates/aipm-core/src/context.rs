use serde::{Deserialize, Serialize};

/// One prompt for a text-completion provider.
///
/// The engine never holds a conversation: every call is a single system
/// framing plus a single rendered prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Framing sent as the system message (may be empty).
    pub system_prompt: String,
    /// The rendered prompt.
    pub current_message: String,
    /// Override the provider's default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature. Extraction calls pin this to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A structured message for chat-style APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    /// "system" or "user".
    pub role: String,
    /// The message content.
    pub content: String,
}

impl Context {
    /// Create a context with no system framing.
    pub fn new(message: &str) -> Self {
        Self {
            system_prompt: String::new(),
            current_message: message.to_string(),
            model: None,
            temperature: None,
        }
    }

    /// Attach a system framing.
    pub fn with_system(mut self, system: &str) -> Self {
        self.system_prompt = system.to_string();
        self
    }

    /// Ask for deterministic output.
    pub fn deterministic(mut self) -> Self {
        self.temperature = Some(0.0);
        self
    }

    /// Convert to chat messages, system first when present.
    pub fn to_api_messages(&self) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            });
        }
        messages.push(ApiMessage {
            role: "user".to_string(),
            content: self.current_message.clone(),
        });
        messages
    }
}
