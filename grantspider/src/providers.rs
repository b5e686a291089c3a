use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;

use grantspider_core::{GrantSpiderError, Llm};
use grantspider_llm::{OllamaClient, OpenAiCompatibleClient};
use grantspider_retrieval::{
    index_corpus, BaseRetriever, HashEmbedder, InMemoryVectorStore, Indexer, IngestionError,
    Retriever, TextSplitter,
};

use crate::settings::{LlmProvider, LlmSettings, RetrievalSettings};

/// Chat model client for the configured provider.
pub fn llm_from_settings(settings: &LlmSettings) -> Result<Arc<dyn Llm>, GrantSpiderError> {
    let timeout = Duration::from_secs(settings.timeout_secs.max(1));
    match settings.provider {
        LlmProvider::OpenAi => {
            let mut builder = OpenAiCompatibleClient::builder()
                .base_url(settings.base_url())?
                .default_model(settings.model.clone())
                .temperature(settings.temperature)
                .timeout(timeout);
            if let Some(key) = &settings.api_key {
                builder = builder.api_key(key.expose_secret().clone());
            }
            Ok(Arc::new(builder.build()?))
        }
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::with_timeout(
            settings.base_url().to_string(),
            settings.model.clone(),
            timeout,
        )?)),
    }
}

/// In-memory retriever over the hashed-token embedder, pre-loaded with the
/// corpus directory when one is configured.
pub async fn retriever_from_settings(
    settings: &RetrievalSettings,
) -> Result<Arc<dyn BaseRetriever>, IngestionError> {
    let indexer = Indexer::new(
        HashEmbedder::new(settings.embedding_dimension),
        InMemoryVectorStore::new(),
    );
    if let Some(dir) = &settings.corpus_dir {
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap);
        let chunks = index_corpus(&indexer, dir, &splitter).await?;
        tracing::info!(corpus = %dir.display(), chunks, "corpus indexed");
    } else {
        tracing::warn!("no corpus configured; every search will come back empty");
    }
    let (embedder, store) = indexer.into_parts();
    Ok(Arc::new(Retriever::new(embedder, store)))
}
