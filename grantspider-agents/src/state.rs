use serde::{Deserialize, Serialize};

use grantspider_core::Chunk;
use grantspider_graph::StateSchema;

use crate::cross_document::CrossDocumentAnalysis;
use crate::language::Language;

/// One flag per agent, set once by that agent and never cleared within a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionFlags {
    pub retrieval_performed: bool,
    pub cross_document_performed: bool,
    pub qa_performed: bool,
    pub source_tracking_performed: bool,
}

impl CompletionFlags {
    pub fn retrieval() -> Self {
        Self {
            retrieval_performed: true,
            ..Self::default()
        }
    }

    pub fn cross_document() -> Self {
        Self {
            cross_document_performed: true,
            ..Self::default()
        }
    }

    pub fn qa() -> Self {
        Self {
            qa_performed: true,
            ..Self::default()
        }
    }

    pub fn source_tracking() -> Self {
        Self {
            source_tracking_performed: true,
            ..Self::default()
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            retrieval_performed: self.retrieval_performed || other.retrieval_performed,
            cross_document_performed: self.cross_document_performed
                || other.cross_document_performed,
            qa_performed: self.qa_performed || other.qa_performed,
            source_tracking_performed: self.source_tracking_performed
                || other.source_tracking_performed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub filename: String,
    pub source_path: String,
    pub chunk_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub answer: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantState {
    pub query: String,
    pub session_id: String,
    #[serde(default)]
    pub retrieved_documents: Vec<Chunk>,
    #[serde(default)]
    pub detected_language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_document_analysis: Option<CrossDocumentAnalysis>,
    #[serde(default)]
    pub qa_response: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub cited_response: String,
    #[serde(default)]
    pub flags: CompletionFlags,
    /// Earlier turns of the session; survives across turns.
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl GrantState {
    pub fn new(query: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Fresh per-turn state that keeps the session's conversation history.
    pub fn next_turn(self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: self.session_id,
            history: self.history,
            ..Self::default()
        }
    }

    /// The answer shown to the user: the cited response once available.
    pub fn answer(&self) -> &str {
        if self.cited_response.is_empty() {
            &self.qa_response
        } else {
            &self.cited_response
        }
    }
}

/// Partial write produced by one agent. Unset fields leave the state alone.
#[derive(Clone, Debug, Default)]
pub struct GrantUpdate {
    pub retrieved_documents: Option<Vec<Chunk>>,
    pub detected_language: Option<Language>,
    pub cross_document_analysis: Option<CrossDocumentAnalysis>,
    pub qa_response: Option<String>,
    pub sources: Option<Vec<Citation>>,
    pub cited_response: Option<String>,
    pub flags: CompletionFlags,
}

impl StateSchema for GrantState {
    type Update = GrantUpdate;

    fn apply(current: &Self, update: GrantUpdate) -> Self {
        let mut next = current.clone();
        if let Some(documents) = update.retrieved_documents {
            next.retrieved_documents = documents;
        }
        if let Some(language) = update.detected_language {
            next.detected_language = language;
        }
        if let Some(analysis) = update.cross_document_analysis {
            next.cross_document_analysis = Some(analysis);
        }
        if let Some(response) = update.qa_response {
            next.qa_response = response;
        }
        if let Some(sources) = update.sources {
            next.sources = sources;
        }
        if let Some(cited) = update.cited_response {
            next.cited_response = cited;
        }
        next.flags = current.flags.union(update.flags);
        next
    }
}
