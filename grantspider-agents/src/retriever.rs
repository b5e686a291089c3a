use async_trait::async_trait;

use grantspider_core::Chunk;
use grantspider_graph::{GraphError, GraphNode, GraphState, StateUpdate};

use crate::context::AgentContext;
use crate::language::Language;
use crate::relevance::assess_relevance;
use crate::state::{CompletionFlags, GrantState, GrantUpdate};

/// Detects the query language, gates off-topic queries and fetches the
/// top-k chunks.
///
/// Always marks retrieval as performed, including on rejection and on search
/// failure, where it records an empty result instead of failing the turn.
pub struct DocumentRetriever {
    context: AgentContext,
}

impl DocumentRetriever {
    pub fn new(context: AgentContext) -> Self {
        Self { context }
    }

    async fn search(&self, query: &str) -> Vec<Chunk> {
        match self
            .context
            .retriever()
            .retrieve(query, self.context.top_k())
            .await
        {
            Ok(results) => results.into_iter().map(Chunk::from).collect(),
            Err(err) => {
                tracing::warn!(error = %err, "document search failed; continuing without documents");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl GraphNode<GrantState> for DocumentRetriever {
    async fn invoke(
        &self,
        state: GraphState<GrantState>,
    ) -> Result<StateUpdate<GrantState>, GraphError> {
        let query = state.data.query.trim();

        let (language, documents) = if query.is_empty() {
            (Language::default(), Vec::new())
        } else {
            let language = Language::detect(query);
            let relevance = assess_relevance(query);
            if relevance.is_accepted() {
                (language, self.search(query).await)
            } else {
                tracing::info!(?relevance, %language, "query rejected by relevance gate");
                (language, Vec::new())
            }
        };

        tracing::info!(documents = documents.len(), %language, "retrieval finished");
        Ok(StateUpdate::new(GrantUpdate {
            retrieved_documents: Some(documents),
            detected_language: Some(language),
            flags: CompletionFlags::retrieval(),
            ..GrantUpdate::default()
        }))
    }
}
