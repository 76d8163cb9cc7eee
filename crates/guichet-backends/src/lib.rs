//! # Guichet Backends
//!
//! Implementations of the embedding and answering capabilities against
//! hosted inference APIs. One unified client handles every OpenAI-compatible
//! chat endpoint; the Hugging Face pipelines cover feature extraction and
//! question answering.

pub mod huggingface;
pub mod registry;

use std::sync::Arc;

use guichet_core::config::GuichetConfig;
use guichet_core::error::{GuichetError, Result};
use guichet_core::traits::{AnswerBackend, TextEmbedder};

use huggingface::{InferenceBackend, PipelineEmbedder};
use registry::AuthStyle;

/// Create the answer backend named by `config.backend.provider`.
pub fn create_backend(config: &GuichetConfig) -> Result<Arc<dyn AnswerBackend>> {
    let provider = config.backend.provider.as_str();

    // Custom endpoint: "custom:https://my-server.com/v1"
    if let Some(rest) = provider.strip_prefix("custom:") {
        let api_key = resolve_api_key(config, &[]);
        return Ok(Arc::new(InferenceBackend::custom(rest, api_key, config)?));
    }

    let preset = registry::get_preset(provider).ok_or_else(|| {
        GuichetError::Config(format!(
            "unknown provider '{provider}' (available: {})",
            registry::all_provider_names().join(", ")
        ))
    })?;
    let api_key = resolve_api_key(config, preset.env_keys);
    require_key(preset.auth_style, &api_key, preset.name, preset.env_keys)?;
    Ok(Arc::new(InferenceBackend::new(preset, api_key, config)?))
}

/// Create the text embedder named by `config.backend.provider`.
pub fn create_embedder(config: &GuichetConfig) -> Result<Arc<dyn TextEmbedder>> {
    let provider = config.backend.provider.as_str();
    let preset = registry::get_preset(provider).ok_or_else(|| {
        GuichetError::Config(format!(
            "provider '{provider}' cannot embed text (available: {})",
            registry::all_provider_names().join(", ")
        ))
    })?;
    let api_key = resolve_api_key(config, preset.env_keys);
    require_key(preset.auth_style, &api_key, preset.name, preset.env_keys)?;
    Ok(Arc::new(PipelineEmbedder::new(preset, api_key, config)?))
}

/// Resolution order: config value, then the provider's env vars, then empty.
fn resolve_api_key(config: &GuichetConfig, env_keys: &[&str]) -> String {
    if !config.backend.api_key.is_empty() {
        return config.backend.api_key.clone();
    }
    env_keys
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_default()
}

fn require_key(style: AuthStyle, api_key: &str, name: &str, env_keys: &[&str]) -> Result<()> {
    if style == AuthStyle::Bearer && api_key.is_empty() {
        return Err(GuichetError::Config(format!(
            "provider '{name}' needs an API key — set backend.api_key or one of: {}",
            env_keys.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_api_key_wins() {
        let mut config = GuichetConfig::default();
        config.backend.api_key = "hf_xxx".into();
        assert_eq!(resolve_api_key(&config, &["SOME_UNSET_VAR"]), "hf_xxx");
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let mut config = GuichetConfig::default();
        config.backend.provider = "minitel".into();
        assert!(matches!(create_backend(&config), Err(GuichetError::Config(_))));
        assert!(matches!(create_embedder(&config), Err(GuichetError::Config(_))));
    }

    #[test]
    fn bearer_providers_require_a_key() {
        assert!(require_key(AuthStyle::Bearer, "", "huggingface", &["HF_API_TOKEN"]).is_err());
        assert!(require_key(AuthStyle::Bearer, "hf_xxx", "huggingface", &[]).is_ok());
        assert!(require_key(AuthStyle::None, "", "ollama", &[]).is_ok());
    }

    #[test]
    fn custom_endpoint_builds_without_registry() {
        let mut config = GuichetConfig::default();
        config.backend.provider = "custom:https://llm.interne.ville.fr/v1".into();
        config.backend.api_key = "secret".into();
        assert!(create_backend(&config).is_ok());
    }
}
