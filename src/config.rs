use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which request shape to use against the completion endpoint.
///
/// `Chat` posts role-tagged messages to `/v1/chat/completions`;
/// `Completion` posts a single prompt string to `/v1/completions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    #[default]
    Chat,
    Completion,
}

impl FromStr for ApiStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(ApiStyle::Chat),
            "completion" => Ok(ApiStyle::Completion),
            other => Err(format!("unknown API style '{}' (expected 'chat' or 'completion')", other)),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub llm_base_url: String,
    pub model: String,
    pub api_style: ApiStyle,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8787".to_string(),
            llm_base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_style: ApiStyle::Chat,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from `PROCNOTE_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_var("PROCNOTE_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            llm_base_url: env_var("PROCNOTE_LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            model: env_var("PROCNOTE_MODEL").unwrap_or(defaults.model),
            api_style: env_var("PROCNOTE_API_STYLE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.api_style),
            request_timeout_secs: env_var("PROCNOTE_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
