use std::collections::BTreeMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use grantspider_core::Chunk;
use grantspider_graph::{GraphError, GraphNode, GraphState, StateUpdate};

use crate::category::{grant_id, DocumentType, GrantCategory};
use crate::state::{CompletionFlags, GrantState, GrantUpdate};

const THEMES: &[&str] = &[
    "eligibility", "budget", "personnel", "cost", "application", "deadline", "criteria",
    "evaluation", "implementation", "uygunluk", "bütçe", "personel", "maliyet", "başvuru",
    "kriterler", "değerlendirme", "uygulama",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    SingleGrant,
    CrossGrant,
    #[default]
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub comparison_type: ComparisonType,
    pub categories_compared: Vec<GrantCategory>,
    pub total_documents: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub theme: String,
    pub frequency: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossDocumentAnalysis {
    /// Chunk count per inferred category.
    pub grant_groups: BTreeMap<GrantCategory, usize>,
    /// Distinct AMIF call ids seen in file names, in first-seen order.
    pub grant_ids: Vec<String>,
    pub document_types: BTreeMap<DocumentType, usize>,
    pub common_themes: Vec<ThemeCount>,
    pub comparison: Comparison,
    pub total_grants_analyzed: usize,
}

fn theme_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        THEMES
            .iter()
            .filter_map(|theme| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(theme)))
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|pattern| (*theme, pattern))
            })
            .collect()
    })
}

fn common_themes(documents: &[Chunk]) -> Vec<ThemeCount> {
    let corpus = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    theme_patterns()
        .iter()
        .filter_map(|(theme, pattern)| {
            let frequency = pattern.find_iter(&corpus).count();
            (frequency > 0).then(|| ThemeCount {
                theme: theme.to_string(),
                frequency,
            })
        })
        .collect()
}

/// Groups chunks by grant category and document type and counts recurring
/// themes. Deterministic: the same chunks always give the same analysis.
pub fn analyze_documents(documents: &[Chunk]) -> CrossDocumentAnalysis {
    if documents.is_empty() {
        return CrossDocumentAnalysis::default();
    }

    let mut grant_groups = BTreeMap::new();
    let mut document_types = BTreeMap::new();
    let mut grant_ids: Vec<String> = Vec::new();

    for doc in documents {
        *grant_groups.entry(GrantCategory::infer(doc)).or_insert(0) += 1;

        let filename = doc.filename().unwrap_or_default();
        *document_types
            .entry(DocumentType::from_filename(filename))
            .or_insert(0) += 1;

        if let Some(id) = doc.filename().or_else(|| doc.source()).and_then(grant_id) {
            if !grant_ids.contains(&id) {
                grant_ids.push(id);
            }
        }
    }

    let categories: Vec<GrantCategory> = grant_groups.keys().copied().collect();
    let comparison = Comparison {
        comparison_type: if categories.len() < 2 {
            ComparisonType::SingleGrant
        } else {
            ComparisonType::CrossGrant
        },
        categories_compared: categories,
        total_documents: documents.len(),
    };

    CrossDocumentAnalysis {
        total_grants_analyzed: grant_groups.len(),
        grant_groups,
        grant_ids,
        document_types,
        common_themes: common_themes(documents),
        comparison,
    }
}

/// Runs [`analyze_documents`] over the retrieved chunks. Makes no model call.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossDocumentAgent;

#[async_trait]
impl GraphNode<GrantState> for CrossDocumentAgent {
    async fn invoke(
        &self,
        state: GraphState<GrantState>,
    ) -> Result<StateUpdate<GrantState>, GraphError> {
        let analysis = analyze_documents(&state.data.retrieved_documents);
        tracing::debug!(
            groups = analysis.total_grants_analyzed,
            themes = analysis.common_themes.len(),
            "cross-document analysis"
        );
        Ok(StateUpdate::new(GrantUpdate {
            cross_document_analysis: Some(analysis),
            flags: CompletionFlags::cross_document(),
            ..GrantUpdate::default()
        }))
    }
}
