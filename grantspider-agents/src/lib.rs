//! The GrantSpider agents and the supervisor that sequences them.

mod category;
mod context;
mod cross_document;
mod language;
mod qa;
mod relevance;
mod retriever;
mod source_tracker;
mod state;
mod supervisor;
mod workflow;

pub use category::{DocumentType, GrantCategory};
pub use context::AgentContext;
pub use cross_document::{
    analyze_documents, Comparison, ComparisonType, CrossDocumentAgent, CrossDocumentAnalysis,
    ThemeCount,
};
pub use language::{tokenize, Language};
pub use qa::{format_documents, QaAgent, QA_TEMPLATE};
pub use relevance::{assess_relevance, is_greeting, Relevance};
pub use retriever::DocumentRetriever;
pub use source_tracker::{add_citations, extract_sources, source_summary, SourceTracker};
pub use state::{Citation, CompletionFlags, GrantState, GrantUpdate, Turn};
pub use supervisor::{RoutingError, Stage, Supervisor};
pub use workflow::{
    grant_graph, CROSS_DOCUMENT, DOCUMENT_RETRIEVER, QA_AGENT, SOURCE_TRACKER, SUPERVISOR,
};
