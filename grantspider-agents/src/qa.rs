use std::collections::HashMap;

use async_trait::async_trait;

use grantspider_core::{Chunk, Value};
use grantspider_graph::{GraphError, GraphNode, GraphState, StateUpdate};
use grantspider_prompt::PromptTemplate;

use crate::context::AgentContext;
use crate::relevance::is_greeting;
use crate::state::{CompletionFlags, GrantState, GrantUpdate};

/// Characters of each chunk passed to the model.
const MAX_CHUNK_CHARS: usize = 800;

/// Single prompt for every language; the model answers in the language of the
/// question.
pub const QA_TEMPLATE: &str = "\
You are an expert assistant that answers questions about AMIF (Asylum, Migration and Integration Fund) grant documents.

Use the information from the following documents to answer the question:

{{documents}}

Question: {{question}}

When answering:
1. Answer in the same language as the question
2. Only use information obtained from the provided documents
3. Indicate which document each piece of information comes from
4. Provide a detailed and understandable explanation
5. If the information is not available in the documents, say so clearly

Answer:";

/// Renders chunks as numbered blocks with a `Document i - filename (Page p):`
/// header, each truncated to 800 characters.
pub fn format_documents(documents: &[Chunk]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(index, doc)| {
            let filename = doc.filename().unwrap_or("Unknown document");
            let page = doc.page_number().unwrap_or_else(|| "unknown".to_string());
            let content: String = doc.content.chars().take(MAX_CHUNK_CHARS).collect();
            format!(
                "Document {} - {} (Page {}):\n{}\n---\n",
                index + 1,
                filename,
                page,
                content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct QaAgent {
    context: AgentContext,
    template: PromptTemplate,
}

impl QaAgent {
    pub fn new(context: AgentContext) -> Self {
        Self {
            context,
            template: PromptTemplate::new(QA_TEMPLATE),
        }
    }

    fn short_circuit(state: &GrantState) -> Option<String> {
        let query = state.query.trim();
        if query.is_empty() || state.retrieved_documents.is_empty() || is_greeting(query) {
            return Some(state.detected_language.no_information_message().to_string());
        }
        None
    }
}

#[async_trait]
impl GraphNode<GrantState> for QaAgent {
    async fn invoke(
        &self,
        state: GraphState<GrantState>,
    ) -> Result<StateUpdate<GrantState>, GraphError> {
        let state = state.data;

        let response = match Self::short_circuit(&state) {
            Some(message) => {
                tracing::info!(language = %state.detected_language, "no documents to answer from");
                message
            }
            None => {
                let mut vars = HashMap::new();
                vars.insert(
                    "documents".to_string(),
                    Value::String(format_documents(&state.retrieved_documents)),
                );
                vars.insert("question".to_string(), Value::String(state.query.clone()));
                let prompt = self.template.render(&vars).map_err(GraphError::node)?;

                tracing::debug!(
                    documents = state.retrieved_documents.len(),
                    prompt_chars = prompt.len(),
                    "invoking model"
                );
                let response = self
                    .context
                    .llm()
                    .invoke(self.context.request(prompt))
                    .await
                    .map_err(GraphError::node)?;
                response.content
            }
        };

        Ok(StateUpdate::new(GrantUpdate {
            qa_response: Some(response),
            flags: CompletionFlags::qa(),
            ..GrantUpdate::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_documents_numbers_and_truncates() {
        let long = "x".repeat(1000);
        let docs = vec![
            Chunk::new("first")
                .with_metadata("filename", "call.pdf")
                .with_metadata("page_number", 3),
            Chunk::new(long),
        ];
        let formatted = format_documents(&docs);
        assert!(formatted.starts_with("Document 1 - call.pdf (Page 3):\nfirst\n---\n"));
        assert!(formatted.contains("Document 2 - Unknown document (Page unknown):\n"));
        assert!(formatted.contains(&"x".repeat(800)));
        assert!(!formatted.contains(&"x".repeat(801)));
    }

    #[test]
    fn template_declares_documents_and_question() {
        let template = PromptTemplate::new(QA_TEMPLATE);
        assert_eq!(
            template.variables().expect("variables"),
            vec!["documents", "question"]
        );
    }
}
