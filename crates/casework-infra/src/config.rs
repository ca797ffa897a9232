//! Configuration loading for Casework.
//!
//! Non-secret settings come from `{data_dir}/config.toml`; API keys come only
//! from the environment and are wrapped in [`SecretString`] on the way in.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use casework_types::config::AppConfig;
use casework_types::error::ConfigError;

/// Resolve the data directory.
///
/// 1. `CASEWORK_DATA_DIR` environment variable
/// 2. `~/.casework`
/// 3. `./.casework`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CASEWORK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".casework");
    }
    PathBuf::from(".casework")
}

/// Load `{data_dir}/config.toml`.
///
/// A missing file yields the defaults. A file that exists but cannot be read
/// or parsed is an error.
pub async fn load_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<AppConfig>(&content).map_err(|err| ConfigError::Parse {
        path: config_path.display().to_string(),
        message: err.to_string(),
    })
}

/// API keys read from the environment. Any of them may be absent; the
/// features that need a missing key report "not configured".
pub struct Secrets {
    pub openai_api_key: Option<SecretString>,
    pub stripe_secret_key: Option<SecretString>,
    pub stripe_webhook_secret: Option<SecretString>,
    /// Overrides `billing.price_id` when set.
    pub stripe_price_id: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: read("OPENAI_API_KEY").map(SecretString::from),
            stripe_secret_key: read("STRIPE_SECRET_KEY").map(SecretString::from),
            stripe_webhook_secret: read("STRIPE_WEBHOOK_SECRET").map(SecretString::from),
            stripe_price_id: read("STRIPE_PRICE_ID"),
        }
    }

    /// Apply environment overrides to the file configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(price_id) = &self.stripe_price_id {
            config.billing.price_id = Some(price_id.clone());
        }
    }
}
