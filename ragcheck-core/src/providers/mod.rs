//! LLM provider implementations.
//!
//! Every configured backend speaks the OpenAI chat completions format
//! (OpenAI, Ollama, vLLM, LM Studio). Use `create_provider()` to build the
//! provider a config names.

pub mod openai_compat;

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

pub use openai_compat::OpenAiCompatibleProvider;

/// Provider names routed to [`OpenAiCompatibleProvider`].
pub const OPENAI_COMPATIBLE_PROVIDERS: &[&str] =
    &["openai", "azure", "ollama", "vllm", "lmstudio", "local"];

/// Create an LLM provider based on the configuration.
///
/// Returns `LlmError::UnknownProvider` for provider names outside
/// [`OPENAI_COMPATIBLE_PROVIDERS`], and `LlmError::AuthFailed` when a
/// remote provider has no resolvable API key.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let name = config.provider.to_ascii_lowercase();
    if OPENAI_COMPATIBLE_PROVIDERS.contains(&name.as_str()) {
        tracing::debug!(provider = %name, model = %config.model, "Creating LLM provider");
        Ok(Arc::new(OpenAiCompatibleProvider::new(config)?))
    } else {
        Err(LlmError::UnknownProvider {
            provider: config.provider.clone(),
        })
    }
}
