mod prompts;


pub use prompts::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::AipmError;

/// Top-level aipm configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aipm: AipmConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AipmConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AipmConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    pub default: String,
    pub openai: Option<OpenAiConfig>,
    pub ollama: Option<OllamaConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            openai: None,
            ollama: None,
        }
    }
}

/// OpenAI-compatible provider config. Defaults point at Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Ollama local provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

/// Memory config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Key of the single project document.
    #[serde(default = "default_document_key")]
    pub document_key: String,
    /// Audit rows kept; older ones are pruned. 0 keeps everything.
    #[serde(default = "default_audit_retention")]
    pub audit_retention: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            document_key: default_document_key(),
            audit_retention: default_audit_retention(),
        }
    }
}

/// Tracker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub jira: Option<JiraConfig>,
}

/// Jira Cloud/Server connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    /// Account id every newly created issue is assigned to. Empty = unassigned.
    #[serde(default)]
    pub default_assignee: String,
    #[serde(default = "default_tracker_timeout")]
    pub timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            email: String::new(),
            api_token: String::new(),
            project_key: String::new(),
            issue_type: default_issue_type(),
            default_assignee: String::new(),
            timeout_secs: default_tracker_timeout(),
        }
    }
}

impl JiraConfig {
    /// Enabled and every connection field filled in.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.base_url.is_empty()
            && !self.email.is_empty()
            && !self.api_token.is_empty()
            && !self.project_key.is_empty()
    }
}

fn default_name() -> String {
    "aipm".to_string()
}
fn default_data_dir() -> String {
    "~/.aipm".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_openai_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_ollama_model() -> String {
    "llama3.1".to_string()
}
fn default_provider_timeout() -> u64 {
    120
}
fn default_db_path() -> String {
    "~/.aipm/data/memory.db".to_string()
}
fn default_document_key() -> String {
    "project_ai_pm".to_string()
}
fn default_audit_retention() -> u32 {
    1000
}
fn default_issue_type() -> String {
    "Task".to_string()
}
fn default_tracker_timeout() -> u64 {
    30
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Overlay credentials from the environment.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = get("GROQ_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
        config
            .provider
            .openai
            .get_or_insert_with(OpenAiConfig::default)
            .api_key = key;
    }

    let jira_vars = [
        "JIRA_URL",
        "JIRA_EMAIL",
        "JIRA_API_TOKEN",
        "JIRA_PROJECT_KEY",
        "JIRA_DEFAULT_ASSIGNEE",
    ];
    if jira_vars.iter().all(|name| get(name).is_none()) {
        return;
    }

    let jira = config.tracker.jira.get_or_insert_with(|| JiraConfig {
        enabled: true,
        ..Default::default()
    });
    if let Some(v) = get("JIRA_URL") {
        jira.base_url = v;
    }
    if let Some(v) = get("JIRA_EMAIL") {
        jira.email = v;
    }
    if let Some(v) = get("JIRA_API_TOKEN") {
        jira.api_token = v;
    }
    if let Some(v) = get("JIRA_PROJECT_KEY") {
        jira.project_key = v;
    }
    if let Some(v) = get("JIRA_DEFAULT_ASSIGNEE") {
        jira.default_assignee = v;
    }
}

/// Load configuration from a TOML file and overlay the environment.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, AipmError> {
    let path = Path::new(path);
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AipmError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| AipmError::Config(format!("failed to parse config: {}", e)))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}
