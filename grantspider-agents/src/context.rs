use std::sync::Arc;

use grantspider_core::{Llm, LlmRequest};
use grantspider_retrieval::BaseRetriever;

/// Collaborators shared by the agents of one graph instance.
#[derive(Clone)]
pub struct AgentContext {
    retriever: Arc<dyn BaseRetriever>,
    llm: Arc<dyn Llm>,
    top_k: usize,
    temperature: Option<f32>,
}

impl AgentContext {
    pub const DEFAULT_TOP_K: usize = 8;

    pub fn new(retriever: Arc<dyn BaseRetriever>, llm: Arc<dyn Llm>) -> Self {
        Self {
            retriever,
            llm,
            top_k: Self::DEFAULT_TOP_K,
            temperature: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn retriever(&self) -> &dyn BaseRetriever {
        self.retriever.as_ref()
    }

    pub fn llm(&self) -> &dyn Llm {
        self.llm.as_ref()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub(crate) fn request(&self, prompt: String) -> LlmRequest {
        LlmRequest {
            temperature: self.temperature,
            ..LlmRequest::from_prompt(prompt)
        }
    }
}
