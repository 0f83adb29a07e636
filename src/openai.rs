//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::{AnimagenError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint.
///
/// The API key is read from the environment variable named in the settings;
/// local endpoints such as Ollama accept any key, so a missing variable is
/// not an error here.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()
        .map_err(|e| AnimagenError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(openai_config(settings)).with_http_client(http_client))
}

fn openai_config(settings: &LlmSettings) -> OpenAIConfig {
    let mut config = OpenAIConfig::new();
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base.trim_end_matches('/'));
    }
    if let Ok(key) = std::env::var(&settings.api_key_env) {
        config = config.with_api_key(key);
    }
    config
}
