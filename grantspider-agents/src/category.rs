use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use grantspider_core::Chunk;

/// AMIF call identifiers, most specific first.
const GRANT_ID_PATTERNS: &[&str] = &[r"(AMIF-\d{4}-TF\d+-AG-[^_]+)", r"(AMIF-\d{4}-[^_]+)"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantCategory {
    Women,
    Children,
    Health,
    Digital,
    Pathways,
    Unknown,
}

impl GrantCategory {
    const KNOWN: [GrantCategory; 5] = [
        GrantCategory::Women,
        GrantCategory::Children,
        GrantCategory::Health,
        GrantCategory::Digital,
        GrantCategory::Pathways,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            GrantCategory::Women => &["WOMEN", "GENDER", "FEMALE"],
            GrantCategory::Children => &["CHILDREN", "CHILD", "MINORS", "YOUTH"],
            GrantCategory::Health => &["HEALTH", "MEDICAL", "HEALTHCARE"],
            GrantCategory::Digital => &["DIGITAL", "TECHNOLOGY", "ONLINE"],
            GrantCategory::Pathways => &["PATHWAYS", "EDUCATION", "TRAINING"],
            GrantCategory::Unknown => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GrantCategory::Women => "WOMEN",
            GrantCategory::Children => "CHILDREN",
            GrantCategory::Health => "HEALTH",
            GrantCategory::Digital => "DIGITAL",
            GrantCategory::Pathways => "PATHWAYS",
            GrantCategory::Unknown => "UNKNOWN",
        }
    }

    /// Highest keyword hit count over uppercased text; ties keep the earlier
    /// category, no hits at all is `Unknown`.
    pub fn from_text(text: &str) -> Self {
        let upper = text.to_uppercase();
        let mut best = GrantCategory::Unknown;
        let mut best_score = 0;
        for category in Self::KNOWN {
            let score = category
                .keywords()
                .iter()
                .filter(|keyword| upper.contains(*keyword))
                .count();
            if score > best_score {
                best = category;
                best_score = score;
            }
        }
        best
    }

    /// `grant_group` metadata first, then an AMIF call id in the file name,
    /// then the chunk text.
    pub fn infer(chunk: &Chunk) -> Self {
        if let Some(group) = chunk
            .metadata_str("grant_group")
            .filter(|group| !group.eq_ignore_ascii_case("unknown_grant"))
        {
            return Self::from_text(group);
        }

        match chunk.filename().or_else(|| chunk.source()) {
            Some(name) => match grant_id(name) {
                Some(id) => Self::from_text(&id),
                None => Self::from_text(&chunk.content),
            },
            None => GrantCategory::Unknown,
        }
    }
}

fn grant_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        GRANT_ID_PATTERNS
            .iter()
            .filter_map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build().ok())
            .collect()
    })
}

/// Uppercased AMIF call id embedded in a file name, extension excluded.
pub(crate) fn grant_id(filename: &str) -> Option<String> {
    let stem = match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('-') => stem,
        _ => filename,
    };
    grant_id_patterns()
        .iter()
        .find_map(|pattern| pattern.captures(stem))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_uppercase())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CallDocument,
    Faq,
    Template,
    Guide,
    AdministrativeGuide,
    EvaluationGuide,
    Other,
}

impl DocumentType {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.contains("call-fiche") || lower.contains("call_fiche") {
            DocumentType::CallDocument
        } else if lower.contains("faq") {
            DocumentType::Faq
        } else if lower.contains("template") {
            DocumentType::Template
        } else if lower.contains("guide") {
            DocumentType::Guide
        } else if lower.contains("aga") {
            DocumentType::AdministrativeGuide
        } else if lower.contains("evaluation") {
            DocumentType::EvaluationGuide
        } else {
            DocumentType::Other
        }
    }
}
