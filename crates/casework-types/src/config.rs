//! Application configuration types for Casework.
//!
//! `AppConfig` mirrors `config.toml` in the data directory. Every field has a
//! default so an empty or missing file is valid. Secrets never live here; they
//! come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub billing: BillingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Language model settings for agent replies, assessment and transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the provider base URL (OpenAI-compatible endpoints).
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f64,

    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,

    #[serde(default = "default_assessment_temperature")]
    pub assessment_temperature: f64,

    #[serde(default = "default_assessment_max_tokens")]
    pub assessment_max_tokens: u32,

    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_chat_temperature() -> f64 {
    0.7
}

fn default_chat_max_tokens() -> u32 {
    1000
}

fn default_assessment_temperature() -> f64 {
    0.3
}

fn default_assessment_max_tokens() -> u32 {
    2000
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            chat_temperature: default_chat_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            assessment_temperature: default_assessment_temperature(),
            assessment_max_tokens: default_assessment_max_tokens(),
            transcription_model: default_transcription_model(),
        }
    }
}

/// Subscription billing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// The only price a checkout may be created for (the Pro monthly plan).
    #[serde(default)]
    pub price_id: Option<String>,

    /// Fallback origin for checkout redirect URLs when the request has none.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            price_id: None,
            public_url: default_public_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.model, "gpt-4-turbo");
        assert_eq!(config.llm.assessment_max_tokens, 2000);
        assert!((config.llm.assessment_temperature - 0.3).abs() < f64::EPSILON);
        assert!(config.billing.price_id.is_none());
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.chat_max_tokens, 1000);
        assert_eq!(config.billing.public_url, "http://localhost:3000");
    }

    #[test]
    fn test_app_config_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 8080

[llm]
model = "gpt-4o"
base_url = "http://localhost:11434/v1"
chat_temperature = 0.5

[billing]
price_id = "price_pro_monthly"
public_url = "https://casework.example"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert!((config.llm.chat_temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.llm.assessment_max_tokens, 2000);
        assert_eq!(config.billing.price_id.as_deref(), Some("price_pro_monthly"));
    }
}
