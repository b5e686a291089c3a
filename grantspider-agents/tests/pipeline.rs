mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{health_corpus, FailingRetriever, RecordingRetriever, ScriptedLlm};
use grantspider_agents::{
    grant_graph, AgentContext, ComparisonType, GrantCategory, GrantState, Language,
};
use grantspider_graph::{ExecutableGraph, GraphError, GraphState};

fn graph(
    retriever: impl grantspider_retrieval::BaseRetriever + 'static,
    llm: ScriptedLlm,
) -> ExecutableGraph<GrantState> {
    let context = AgentContext::new(Arc::new(retriever), Arc::new(llm));
    grant_graph(context).build().expect("build")
}

async fn run(graph: &ExecutableGraph<GrantState>, query: &str) -> GrantState {
    graph
        .invoke_graph(GraphState::new(GrantState::new(query, "test-session")))
        .await
        .expect("invoke")
        .data
}

#[tokio::test]
async fn greeting_skips_search_and_model() {
    let retriever = health_corpus();
    let llm = ScriptedLlm::answering("should not be used");
    let graph = graph(retriever.clone(), llm.clone());

    let out = run(&graph, "Merhaba").await;

    assert_eq!(retriever.call_count(), 0);
    assert_eq!(llm.calls(), 0);
    assert!(out.retrieved_documents.is_empty());
    assert!(out.sources.is_empty());
    assert_eq!(out.detected_language, Language::Turkish);
    assert_eq!(out.qa_response, Language::Turkish.no_information_message());
    assert_eq!(out.cited_response, out.qa_response);
    assert!(out.flags.retrieval_performed);
    assert!(out.flags.qa_performed);
    assert!(out.flags.source_tracking_performed);
}

#[tokio::test]
async fn eligibility_question_runs_the_full_pipeline() {
    let retriever = health_corpus();
    let llm = ScriptedLlm::answering("Applicants must be legal entities.");
    let graph = graph(retriever.clone(), llm.clone());

    let out = run(&graph, "What are the eligibility criteria for AMIF health grants?").await;

    let calls = retriever.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            "What are the eligibility criteria for AMIF health grants?".to_string(),
            8
        )]
    );
    assert_eq!(llm.calls(), 1);
    assert_eq!(out.detected_language, Language::English);
    assert_eq!(out.retrieved_documents.len(), 3);

    let analysis = out.cross_document_analysis.as_ref().expect("analysis");
    assert_eq!(analysis.grant_groups.get(&GrantCategory::Health), Some(&2));
    assert_eq!(analysis.grant_groups.get(&GrantCategory::Women), Some(&1));
    assert_eq!(analysis.comparison.comparison_type, ComparisonType::CrossGrant);

    assert_eq!(out.sources.len(), 2);
    assert_eq!(
        out.cited_response,
        "Applicants must be legal entities.\n\n**Sources:**\n\
         1. AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf\n\
         2. AMIF-2025-TF2-AG-INTE-01-WOMEN_faq.pdf\n"
    );

    let prompt = llm.last_prompt().expect("prompt");
    assert!(prompt.contains("Question: What are the eligibility criteria for AMIF health grants?"));
    assert!(prompt.contains(
        "Document 1 - AMIF-2025-TF2-AG-INTE-02-HEALTH_call-fiche.pdf (Page 1):"
    ));
    assert!(prompt.contains("same language as the question"));
}

#[tokio::test]
async fn repeated_runs_reference_the_same_documents() {
    let graph = graph(health_corpus(), ScriptedLlm::answering("ok"));
    let query = "Which personnel costs are eligible under the AMIF call?";

    let first = run(&graph, query).await;
    let second = run(&graph, query).await;

    assert_eq!(first.retrieved_documents, second.retrieved_documents);
    assert_eq!(first.sources, second.sources);
}

#[tokio::test]
async fn store_failure_degrades_to_no_documents() {
    let retriever = FailingRetriever::default();
    let attempts = retriever.attempts.clone();
    let llm = ScriptedLlm::answering("unused");
    let graph = graph(retriever, llm.clone());

    let out = run(&graph, "AMIF başvuru kriterleri nelerdir?").await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(out.retrieved_documents.is_empty());
    assert_eq!(out.detected_language, Language::Turkish);
    assert_eq!(out.qa_response, Language::Turkish.no_information_message());
    assert_eq!(llm.calls(), 0);
    assert!(out.flags.source_tracking_performed);
}

#[tokio::test]
async fn off_topic_short_query_is_not_searched() {
    let retriever = health_corpus();
    let graph = graph(retriever.clone(), ScriptedLlm::answering("unused"));

    let out = run(&graph, "tell me a joke").await;

    assert_eq!(retriever.call_count(), 0);
    assert!(out.retrieved_documents.is_empty());
    assert!(out.flags.qa_performed);
}

#[tokio::test]
async fn empty_query_defaults_to_turkish_without_search() {
    let retriever = health_corpus();
    let graph = graph(retriever.clone(), ScriptedLlm::answering("unused"));

    let out = run(&graph, "   ").await;

    assert_eq!(retriever.call_count(), 0);
    assert_eq!(out.detected_language, Language::Turkish);
    assert_eq!(out.qa_response, Language::Turkish.no_information_message());
}

#[tokio::test]
async fn model_failure_is_retried_then_surfaced() {
    let llm = ScriptedLlm::failing();
    let graph = graph(health_corpus(), llm.clone());

    let err = graph
        .invoke_graph(GraphState::new(GrantState::new(
            "What is the budget for AMIF grants?",
            "s",
        )))
        .await
        .expect_err("model failure");

    match err {
        GraphError::NodeFailed {
            node,
            attempts,
            source,
        } => {
            assert_eq!(node, "qa_agent");
            assert_eq!(attempts, 2);
            assert!(source.to_string().contains("model unavailable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn custom_top_k_reaches_the_retriever() {
    let retriever = RecordingRetriever::default();
    let context = AgentContext::new(Arc::new(retriever.clone()), Arc::new(ScriptedLlm::default()))
        .with_top_k(3);
    let graph = grant_graph(context).build().expect("build");

    graph
        .invoke_graph(GraphState::new(GrantState::new("AMIF grant budget", "s")))
        .await
        .expect("invoke");

    assert_eq!(retriever.calls.lock().unwrap()[0].1, 3);
}

#[test]
fn diagram_shows_the_hub() {
    let graph = graph(health_corpus(), ScriptedLlm::default());
    let mermaid = graph.program().to_mermaid();
    assert!(mermaid.contains("supervisor{supervisor}"));
    assert!(mermaid.contains("supervisor -.-> qa_agent"));
    assert!(mermaid.contains("source_tracker --> supervisor"));
    assert!(mermaid.contains("supervisor -.-> __end__"));
}
