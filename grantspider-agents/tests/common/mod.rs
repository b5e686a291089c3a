#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grantspider_core::{
    Document, GrantSpiderError, Llm, LlmRequest, LlmResponse, SearchResult, StoreError, Value,
};
use grantspider_retrieval::{BaseRetriever, RetrievalError};

/// Returns a fixed answer (or error) and records every prompt it sees.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    pub answer: String,
    pub fail: bool,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, GrantSpiderError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);
        if self.fail {
            return Err(GrantSpiderError::LlmProvider("model unavailable".to_string()));
        }
        Ok(LlmResponse {
            content: self.answer.clone(),
        })
    }
}

/// Serves a fixed result list and records each `(query, top_k)` call.
#[derive(Clone, Default)]
pub struct RecordingRetriever {
    pub results: Vec<SearchResult>,
    pub calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl RecordingRetriever {
    pub fn with_documents(docs: Vec<(&str, &str, &str, u64)>) -> Self {
        let results = docs
            .into_iter()
            .enumerate()
            .map(|(i, (filename, source, content, chunk_index))| {
                let mut document = Document {
                    id: format!("{filename}#{chunk_index}"),
                    content: content.to_string(),
                    metadata: Default::default(),
                    embedding: None,
                };
                document
                    .metadata
                    .insert("filename".to_string(), Value::from(filename));
                document
                    .metadata
                    .insert("source".to_string(), Value::from(source));
                document
                    .metadata
                    .insert("page_number".to_string(), Value::from(1));
                document
                    .metadata
                    .insert("chunk_index".to_string(), Value::from(chunk_index));
                SearchResult {
                    document,
                    score: 1.0 - i as f32 * 0.1,
                }
            })
            .collect();
        Self {
            results,
            calls: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseRetriever for RecordingRetriever {
    async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        self.calls.lock().unwrap().push((query.to_string(), top_k));
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

/// Every search fails as if the store were down.
#[derive(Clone, Default)]
pub struct FailingRetriever {
    pub attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl BaseRetriever for FailingRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RetrievalError::Store(StoreError::Unavailable(
            "connection refused".to_string(),
        )))
    }
}

pub fn health_corpus() -> RecordingRetriever {
    RecordingRetriever::with_documents(vec![
        (
            "AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf",
            "/docs/AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf",
            "Eligibility criteria: applicants must be legal entities established in a Member State.",
            0,
        ),
        (
            "AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf",
            "/docs/AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf",
            "The budget covers personnel costs and healthcare services.",
            3,
        ),
        (
            "AMIF-2025-TF2-AG-INTE-01-WOMEN_faq.pdf",
            "/docs/AMIF-2025-TF2-AG-INTE-01-WOMEN_faq.pdf",
            "FAQ on eligibility of gender equality projects.",
            1,
        ),
    ])
}
