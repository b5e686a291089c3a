#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use grantspider::{GrantSpider, Settings};
use grantspider_core::{
    Document, GrantSpiderError, Llm, LlmRequest, LlmResponse, SearchResult, Value,
};
use grantspider_retrieval::{BaseRetriever, RetrievalError};

/// Answers with a fixed text after an optional delay and records prompts.
#[derive(Clone, Default)]
pub struct CannedLlm {
    pub answer: String,
    pub delay: Option<Duration>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            ..Self::default()
        }
    }

    pub fn slow(answer: &str, delay: Duration) -> Self {
        Self {
            answer: answer.to_string(),
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Llm for CannedLlm {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, GrantSpiderError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Some(delay) = self.delay {
            // Queries mentioning "slow" take the long path.
            if prompt.contains("slow") {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(LlmResponse {
            content: self.answer.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct FixedRetriever {
    pub results: Vec<SearchResult>,
}

#[async_trait]
impl BaseRetriever for FixedRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        Ok(self.results.iter().take(top_k).cloned().collect())
    }
}

pub fn chunk(filename: &str, content: &str, chunk_index: u64) -> SearchResult {
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
        .insert("source".to_string(), Value::from(format!("/docs/{filename}")));
    document
        .metadata
        .insert("chunk_index".to_string(), Value::from(chunk_index));
    SearchResult {
        document,
        score: 0.9,
    }
}

pub fn grant_corpus() -> FixedRetriever {
    FixedRetriever {
        results: vec![
            chunk(
                "AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.txt",
                "Eligibility criteria: applicants must be legal entities.",
                0,
            ),
            chunk(
                "AMIF-2025-TF2-AG-INTE-01-WOMEN_faq.txt",
                "The budget covers personnel costs for gender equality projects.",
                2,
            ),
        ],
    }
}

pub fn spider(llm: CannedLlm, settings: Settings) -> GrantSpider {
    GrantSpider::builder()
        .with_llm(Arc::new(llm))
        .with_retriever(Arc::new(grant_corpus()))
        .with_settings(settings)
        .build()
        .expect("spider")
}
