//! LLM generation: one structuring request per document.
//!
//! The extracted text goes to an LLM with the structuring prompt from
//! [`crate::prompts`]; the raw reply is returned untouched and normalised
//! later by [`crate::salvage`]. There is exactly one call and no retry: a
//! provider error aborts the conversion as
//! [`Pdf2NotionError::GenerationUnavailable`].

use crate::config::ConversionConfig;
use crate::error::Pdf2NotionError;
use crate::prompts::{structuring_request, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Raw reply of the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    pub raw: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Turns extracted text into a (loosely) structured reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Name used in errors and logs.
    fn name(&self) -> String;

    async fn generate(&self, text: &str) -> Result<Generated, Pdf2NotionError>;
}

/// [`TextGenerator`] backed by an edgequake-llm provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    system_prompt: String,
    options: CompletionOptions,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &ConversionConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and wrap it.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2NotionError> {
        let (provider, label) = resolve_provider(config)?;
        Ok(Self::new(provider, label, config))
    }
}

impl std::fmt::Debug for LlmGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGenerator")
            .field("provider", &self.label)
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    fn name(&self) -> String {
        self.label.clone()
    }

    async fn generate(&self, text: &str) -> Result<Generated, Pdf2NotionError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(structuring_request(text)),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| Pdf2NotionError::GenerationUnavailable {
                provider: self.label.clone(),
                detail: e.to_string(),
            })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Generation: {} input tokens, {} output tokens, {}ms",
            response.prompt_tokens, response.completion_tokens, duration_ms
        );

        Ok(Generated {
            raw: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
            duration_ms,
        })
    }
}

fn build_options(config: &ConversionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(name: &str, model: &str) -> Result<(Arc<dyn LLMProvider>, String), Pdf2NotionError> {
    let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        Pdf2NotionError::GenerationUnavailable {
            provider: name.to_string(),
            detail: e.to_string(),
        }
    })?;
    Ok((provider, format!("{name}/{model}")))
}

/// Resolve the LLM provider, most specific first:
///
/// 1. a provider set on the config
/// 2. `provider_name` (+ `model`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` and `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env`
pub fn resolve_provider(
    config: &ConversionConfig,
) -> Result<(Arc<dyn LLMProvider>, String), Pdf2NotionError> {
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), "custom".to_string()));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(name), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !name.is_empty() && !env_model.is_empty() {
            return create_provider(&name, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2NotionError::GenerationUnavailable {
            provider: "auto".to_string(),
            detail: format!(
                "no provider could be detected from the environment \
                 (set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider): {e}"
            ),
        })?;
    info!("Using auto-detected LLM provider");
    Ok((provider, "auto".to_string()))
}
