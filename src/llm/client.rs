//! Reasoning service client abstraction
//!
//! Tool selection and finding synthesis optionally consult an external
//! text-in/text-out service. Two backends are supported:
//! - **Ollama**: local inference (feature `ollama`, on by default)
//! - **OpenAI**: OpenAI API and compatible endpoints (feature `openai`)

use crate::types::{AppError, Result};
use crate::utils::toml_config::{ConveneConfig, ProviderConfig};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including OpenAI-compatible APIs)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolve the `[reasoning]` section into a concrete provider.
    ///
    /// Returns `Ok(None)` when no reasoning service is configured.
    pub fn from_config(config: &ConveneConfig) -> Result<Option<Self>> {
        let Some(reasoning) = &config.reasoning else {
            return Ok(None);
        };

        let provider = match &reasoning.provider {
            ProviderConfig::Ollama { base_url, model } => Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            },
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => {
                let api_key = config.resolve_env(api_key_env).ok_or_else(|| {
                    AppError::Config(format!("Environment variable {} is not set", api_key_env))
                })?;
                Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                }
            }
        };
        Ok(Some(provider))
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's cargo feature is disabled.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Config(format!(
                "{} support is not compiled in; rebuild with the '{}' feature",
                other.name(),
                other.feature()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Cargo feature that enables this provider
    pub fn feature(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "openai",
            Provider::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Configuration-based client factory
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    /// Build a factory from config, or `None` when no reasoning service is configured
    pub fn from_config(config: &ConveneConfig) -> Result<Option<Self>> {
        Ok(Provider::from_config(config)?.map(Self::new))
    }

    /// Create a client using the default provider
    pub async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }

    /// Get a reference to the default provider
    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::ReasoningConfig;

    fn reasoning(provider: ProviderConfig) -> ConveneConfig {
        ConveneConfig {
            reasoning: Some(ReasoningConfig {
                provider,
                selection_timeout_secs: 6,
                synthesis_timeout_secs: 15,
                synthesis_max_chars: 600,
            }),
            ..ConveneConfig::default()
        }
    }

    #[test]
    fn test_no_reasoning_section_means_no_provider() {
        let config = ConveneConfig::default();
        assert!(Provider::from_config(&config).unwrap().is_none());
        assert!(LLMClientFactory::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_ollama_provider_from_config() {
        let config = reasoning(ProviderConfig::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        });
        let provider = Provider::from_config(&config).unwrap().unwrap();
        assert_eq!(provider.name(), "Ollama");
        assert_eq!(provider.model(), "llama3.2");
    }

    #[test]
    fn test_openai_provider_requires_key() {
        let config = reasoning(ProviderConfig::OpenAI {
            api_key_env: "CONVENE_TEST_KEY_THAT_DOES_NOT_EXIST".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        });
        assert!(matches!(
            Provider::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_factory_default_provider() {
        let factory = LLMClientFactory::new(Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        });
        assert_eq!(factory.default_provider().name(), "Ollama");
        assert_eq!(factory.default_provider().feature(), "ollama");
    }
}
