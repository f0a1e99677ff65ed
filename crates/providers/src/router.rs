//! Provider construction: selects and builds the LLM backend from config.

use std::sync::Arc;
use std::time::Duration;
use stepwise_core::error::ProviderError;
use stepwise_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// `api_url` in the config wins over the well-known URL for the provider
/// name; an unknown provider without `api_url` is a configuration error.
pub fn build_from_config(
    config: &stepwise_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => default_base_url(&config.provider).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{}': set api_url in config.toml",
                config.provider
            ))
        })?,
    };

    let api_key = config.api_key.clone().unwrap_or_default();
    let timeout = config.request_timeout_secs.map(Duration::from_secs);

    debug!(provider = %config.provider, base_url = %base_url, "Building provider");

    Ok(Arc::new(OpenAiCompatProvider::with_timeout(
        &config.provider,
        base_url,
        api_key,
        timeout,
    )))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
