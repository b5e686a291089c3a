use std::collections::HashSet;

use async_trait::async_trait;

use grantspider_core::Chunk;
use grantspider_graph::{GraphError, GraphNode, GraphState, StateUpdate};

use crate::language::Language;
use crate::state::{Citation, CompletionFlags, GrantState, GrantUpdate};

/// One citation per distinct `(filename, source_path)`, in first-seen order.
pub fn extract_sources(documents: &[Chunk]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter_map(|doc| {
            let filename = doc.filename().unwrap_or("Unknown").to_string();
            let source_path = doc.source().unwrap_or_default().to_string();
            if !seen.insert((filename.clone(), source_path.clone())) {
                return None;
            }
            Some(Citation {
                filename,
                source_path,
                chunk_index: doc.chunk_index(),
                similarity_score: doc.similarity_score,
            })
        })
        .collect()
}

/// Appends a numbered list of file names under a localized heading.
pub fn add_citations(response: &str, sources: &[Citation], language: Language) -> String {
    if sources.is_empty() {
        return response.to_string();
    }
    let mut cited = format!("{response}\n\n{}\n", language.sources_heading());
    for (index, source) in sources.iter().enumerate() {
        cited.push_str(&format!("{}. {}\n", index + 1, source.filename));
    }
    cited
}

/// e.g. "5 chunks used from 3 distinct documents."
pub fn source_summary(sources: &[Citation], language: Language) -> String {
    if sources.is_empty() {
        return match language {
            Language::Turkish => "Hiç kaynak bulunamadı.",
            Language::English => "No sources found.",
            Language::Italian => "Nessuna fonte trovata.",
        }
        .to_string();
    }
    let files = sources
        .iter()
        .map(|source| source.filename.as_str())
        .collect::<HashSet<_>>()
        .len();
    let chunks = sources.len();
    match language {
        Language::Turkish => {
            format!("Toplam {chunks} chunk, {files} farklı belgeden kullanıldı.")
        }
        Language::English => format!("{chunks} chunks used from {files} distinct documents."),
        Language::Italian => {
            format!("{chunks} frammenti utilizzati da {files} documenti distinti.")
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SourceTracker;

#[async_trait]
impl GraphNode<GrantState> for SourceTracker {
    async fn invoke(
        &self,
        state: GraphState<GrantState>,
    ) -> Result<StateUpdate<GrantState>, GraphError> {
        let state = state.data;
        let sources = extract_sources(&state.retrieved_documents);
        let cited = add_citations(&state.qa_response, &sources, state.detected_language);

        tracing::debug!(sources = sources.len(), "citations attached");
        Ok(StateUpdate::new(GrantUpdate {
            sources: Some(sources),
            cited_response: Some(cited),
            flags: CompletionFlags::source_tracking(),
            ..GrantUpdate::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(filename: &str, source: &str, index: u64) -> Chunk {
        Chunk::new("text")
            .with_metadata("filename", filename)
            .with_metadata("source", source)
            .with_metadata("chunk_index", index)
    }

    #[test]
    fn duplicates_are_dropped_in_first_seen_order() {
        let docs = vec![
            chunk("b.pdf", "/docs/b.pdf", 4),
            chunk("a.pdf", "/docs/a.pdf", 0),
            chunk("b.pdf", "/docs/b.pdf", 7),
            chunk("b.pdf", "/archive/b.pdf", 1),
        ];
        let sources = extract_sources(&docs);
        let keys: Vec<_> = sources
            .iter()
            .map(|s| (s.filename.as_str(), s.source_path.as_str(), s.chunk_index))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("b.pdf", "/docs/b.pdf", 4),
                ("a.pdf", "/docs/a.pdf", 0),
                ("b.pdf", "/archive/b.pdf", 1),
            ]
        );
    }

    #[test]
    fn citations_are_numbered_under_a_localized_heading() {
        let sources = extract_sources(&[chunk("a.pdf", "/a", 0), chunk("b.pdf", "/b", 0)]);
        assert_eq!(
            add_citations("Answer.", &sources, Language::Turkish),
            "Answer.\n\n**Kaynaklar:**\n1. a.pdf\n2. b.pdf\n"
        );
        assert!(add_citations("Answer.", &sources, Language::English).contains("**Sources:**"));
        assert_eq!(add_citations("Answer.", &[], Language::English), "Answer.");
    }

    #[test]
    fn summary_counts_chunks_and_files() {
        let sources = extract_sources(&[
            chunk("a.pdf", "/a", 0),
            chunk("a.pdf", "/copy/a", 0),
            chunk("b.pdf", "/b", 0),
        ]);
        assert_eq!(
            source_summary(&sources, Language::Turkish),
            "Toplam 3 chunk, 2 farklı belgeden kullanıldı."
        );
        assert_eq!(
            source_summary(&sources, Language::English),
            "3 chunks used from 2 distinct documents."
        );
        assert_eq!(source_summary(&[], Language::English), "No sources found.");
    }
}
