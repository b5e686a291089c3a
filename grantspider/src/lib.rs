//! GrantSpider answers questions about AMIF grant documents with a small
//! team of agents: a retriever, a cross-document analyser, a QA agent and a
//! source tracker, sequenced by a supervisor.
//!
//! [`GrantSpider`] is the session-level entry point. Each call to
//! [`GrantSpider::run`] is one conversation turn: the session's previous
//! state is loaded from the checkpointer, the per-turn fields are reset, the
//! graph runs to completion and the turn is appended to the session history.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use grantspider_agents::{
    grant_graph, AgentContext, Citation, CrossDocumentAnalysis, GrantState, Language, Turn,
};
use grantspider_core::{Chunk, GrantSpiderError, Llm};
use grantspider_graph::{
    Checkpoint, Checkpointer, ExecutableGraph, ExecutionConfig, ExecutionOptions, GraphError,
    GraphEvent, GraphState, InMemoryCheckpointer, END,
};
use grantspider_retrieval::{BaseRetriever, HashEmbedder, InMemoryVectorStore, Retriever};

pub mod batch;
mod providers;
pub mod settings;

pub use providers::{llm_from_settings, retriever_from_settings};
pub use settings::{Settings, SettingsError};

use settings::LlmSettings;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a retriever is required")]
    MissingRetriever,
    #[error("an llm is required")]
    MissingLlm,
    #[error("session id must not be empty")]
    EmptySessionId,
    #[error(transparent)]
    Llm(#[from] GrantSpiderError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// What one turn produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnResult {
    pub session_id: String,
    pub query: String,
    pub qa_response: String,
    pub cited_response: String,
    pub sources: Vec<Citation>,
    pub retrieved_documents: Vec<Chunk>,
    pub cross_document_analysis: Option<CrossDocumentAnalysis>,
    pub detected_language: Language,
}

impl From<GrantState> for TurnResult {
    fn from(state: GrantState) -> Self {
        Self {
            session_id: state.session_id,
            query: state.query,
            qa_response: state.qa_response,
            cited_response: state.cited_response,
            sources: state.sources,
            retrieved_documents: state.retrieved_documents,
            cross_document_analysis: state.cross_document_analysis,
            detected_language: state.detected_language,
        }
    }
}

pub type SessionEventStream = ReceiverStream<Result<GraphEvent<GrantState>, SessionError>>;

#[derive(Clone)]
pub struct GrantSpider {
    graph: Arc<ExecutableGraph<GrantState>>,
    checkpointer: Arc<dyn Checkpointer<GrantState>>,
    max_history: usize,
    event_buffer_size: usize,
}

pub struct GrantSpiderBuilder {
    retriever: Option<Arc<dyn BaseRetriever>>,
    llm: Option<Arc<dyn Llm>>,
    checkpointer: Arc<dyn Checkpointer<GrantState>>,
    settings: Settings,
    event_buffer_size: usize,
}

impl GrantSpider {
    pub fn builder() -> GrantSpiderBuilder {
        GrantSpiderBuilder {
            retriever: None,
            llm: None,
            checkpointer: Arc::new(InMemoryCheckpointer::<GrantState>::new()),
            settings: Settings::default(),
            event_buffer_size: 64,
        }
    }

    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }

    /// Runs one turn to completion and persists it to the session.
    pub async fn run(&self, query: &str, session_id: &str) -> Result<TurnResult, SessionError> {
        let state = self.begin_turn(query, session_id).await?;
        let options = ExecutionOptions::for_thread(session_id);
        let finished = self
            .graph
            .invoke_graph_with_options(GraphState::new(state), options)
            .await?;
        let state = self.finish_turn(finished.data).await?;
        Ok(TurnResult::from(state))
    }

    /// Runs one turn and yields the graph's events as each node finishes.
    /// The `Completed` event carries the state after the turn was appended
    /// to the session history.
    pub async fn stream(
        &self,
        query: &str,
        session_id: &str,
    ) -> Result<SessionEventStream, SessionError> {
        let state = self.begin_turn(query, session_id).await?;
        let options = ExecutionOptions::for_thread(session_id);
        let (tx, rx) = mpsc::channel(self.event_buffer_size);
        let session = self.clone();

        tokio::spawn(async move {
            let mut events = session
                .graph
                .stream_invoke(GraphState::new(state), options);
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(GraphEvent::Completed { state }) => session
                        .finish_turn(state.data)
                        .await
                        .map(|data| GraphEvent::Completed {
                            state: GraphState::new(data),
                        }),
                    Ok(event) => Ok(event),
                    Err(error) => Err(SessionError::from(error)),
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Earlier turns of the session, oldest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Turn>, SessionError> {
        Ok(self
            .checkpointer
            .load(session_id)
            .await?
            .map(|checkpoint| checkpoint.state.data.history)
            .unwrap_or_default())
    }

    pub fn mermaid(&self) -> String {
        self.graph.program().to_mermaid()
    }

    /// The agent graph as a mermaid diagram without a configured session.
    /// The agents are wired to an empty index and a default client that is
    /// never called.
    pub fn diagram() -> Result<String, SessionError> {
        let retriever: Arc<dyn BaseRetriever> =
            Arc::new(Retriever::new(HashEmbedder::new(1), InMemoryVectorStore::new()));
        let llm = llm_from_settings(&LlmSettings::default())?;
        let graph = grant_graph(AgentContext::new(retriever, llm)).build()?;
        Ok(graph.program().to_mermaid())
    }

    async fn begin_turn(&self, query: &str, session_id: &str) -> Result<GrantState, SessionError> {
        if session_id.trim().is_empty() {
            return Err(SessionError::EmptySessionId);
        }
        let state = match self.checkpointer.load(session_id).await? {
            Some(checkpoint) => checkpoint.state.data.next_turn(query),
            None => GrantState::new(query, session_id),
        };
        tracing::debug!(
            session = %session_id,
            history = state.history.len(),
            "turn started"
        );
        Ok(state)
    }

    async fn finish_turn(&self, mut state: GrantState) -> Result<GrantState, SessionError> {
        state.history.push(Turn {
            query: state.query.clone(),
            answer: state.answer().to_string(),
        });
        if state.history.len() > self.max_history {
            let excess = state.history.len() - self.max_history;
            state.history.drain(..excess);
        }

        let step = self
            .checkpointer
            .load(&state.session_id)
            .await?
            .map(|checkpoint| checkpoint.step)
            .unwrap_or_default();
        let checkpoint = Checkpoint::new(
            state.session_id.clone(),
            GraphState::new(state.clone()),
            step,
            END.to_string(),
        );
        self.checkpointer.save(&checkpoint).await?;
        tracing::info!(
            session = %state.session_id,
            language = %state.detected_language,
            sources = state.sources.len(),
            "turn completed"
        );
        Ok(state)
    }
}

impl GrantSpiderBuilder {
    pub fn with_retriever(mut self, retriever: Arc<dyn BaseRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_checkpointer<C>(mut self, checkpointer: C) -> Self
    where
        C: Checkpointer<GrantState> + 'static,
    {
        self.checkpointer = Arc::new(checkpointer);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_buffer_size(mut self, event_buffer_size: usize) -> Self {
        if event_buffer_size > 0 {
            self.event_buffer_size = event_buffer_size;
        }
        self
    }

    pub fn build(self) -> Result<GrantSpider, SessionError> {
        let retriever = self.retriever.ok_or(SessionError::MissingRetriever)?;
        let llm = self.llm.ok_or(SessionError::MissingLlm)?;
        let settings = self.settings;

        let context = AgentContext::new(retriever, llm)
            .with_top_k(settings.retrieval.top_k)
            .with_temperature(settings.llm.temperature);
        let config = ExecutionConfig {
            max_steps: Some(settings.graph.max_steps),
            max_node_attempts: settings.graph.max_node_attempts,
            event_buffer: self.event_buffer_size,
        };
        let graph = grant_graph(context)
            .with_default_config(config)
            .with_checkpointer(self.checkpointer.clone())
            .build()?;

        Ok(GrantSpider {
            graph: Arc::new(graph),
            checkpointer: self.checkpointer,
            max_history: settings.session.max_history.max(1),
            event_buffer_size: self.event_buffer_size,
        })
    }
}
