use grantspider_graph::GraphBuilder;

use crate::context::AgentContext;
use crate::cross_document::CrossDocumentAgent;
use crate::qa::QaAgent;
use crate::retriever::DocumentRetriever;
use crate::source_tracker::SourceTracker;
use crate::state::GrantState;
use crate::supervisor::Supervisor;

pub const SUPERVISOR: &str = "supervisor";
pub const DOCUMENT_RETRIEVER: &str = "document_retriever";
pub const CROSS_DOCUMENT: &str = "cross_document";
pub const QA_AGENT: &str = "qa_agent";
pub const SOURCE_TRACKER: &str = "source_tracker";

/// Hub-and-spoke graph: the supervisor is the entry, and every agent hands
/// control back to it.
pub fn grant_graph(context: AgentContext) -> GraphBuilder<GrantState> {
    GraphBuilder::new()
        .add_router(SUPERVISOR, Supervisor)
        .add_node(DOCUMENT_RETRIEVER, DocumentRetriever::new(context.clone()))
        .add_node(CROSS_DOCUMENT, CrossDocumentAgent)
        .add_node(QA_AGENT, QaAgent::new(context))
        .add_node(SOURCE_TRACKER, SourceTracker)
        .add_edge(DOCUMENT_RETRIEVER, SUPERVISOR)
        .add_edge(CROSS_DOCUMENT, SUPERVISOR)
        .add_edge(QA_AGENT, SUPERVISOR)
        .add_edge(SOURCE_TRACKER, SUPERVISOR)
        .set_entry(SUPERVISOR)
}
