mod ollama;

// OpenAI-compatible client (OpenAI, OpenRouter, DeepSeek, vLLM, ...)
pub mod openai_compatible;

use std::time::Duration;

use grantspider_core::GrantSpiderError;

pub use grantspider_core::{Llm, LlmRequest, LlmResponse, Message, Role};
pub use ollama::OllamaClient;
pub use openai_compatible::{
    ChatCompletionRequest, OpenAiCompatibleBuilder, OpenAiCompatibleClient,
};

/// A request that outlives the client timeout maps to `Timeout`.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> GrantSpiderError {
    if err.is_timeout() {
        GrantSpiderError::Timeout(timeout)
    } else {
        GrantSpiderError::LlmProvider(err.to_string())
    }
}
