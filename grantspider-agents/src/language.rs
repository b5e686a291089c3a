use serde::{Deserialize, Serialize};

const TURKISH_INDICATORS: &[&str] = &[
    "nedir", "nelerdir", "nasıl", "ne", "hangi", "için", "ile", "bir", "bu", "şu", "mı", "mi",
    "mu", "mü", "da", "de", "ta", "te", "la", "le", "ın", "in", "un", "ün", "hibe", "başvuru",
    "proje", "belgeler", "kriterler", "süreç",
];

const ENGLISH_INDICATORS: &[&str] = &[
    "what", "how", "which", "where", "when", "why", "is", "are", "the", "and", "or", "in", "on",
    "at", "for", "with", "by", "from", "to", "of", "grant", "application", "project", "documents",
    "criteria", "process", "requirements", "eligibility", "personnel", "costs", "budget",
    "funding", "can", "should", "must", "will", "this", "that", "these", "those", "do", "does",
    "did", "have", "has", "had",
];

const ITALIAN_INDICATORS: &[&str] = &[
    "che", "cosa", "come", "quale", "dove", "quando", "perché", "è", "sono", "il", "la", "di",
    "a", "da", "in", "con", "su", "per", "tra", "fra", "sovvenzioni", "domanda", "progetto",
    "documenti", "criteri", "processo",
];

/// Lowercased word tokens; anything that is not a letter or digit separates words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Turkish,
    English,
    Italian,
}

impl Language {
    /// Scores each language by how many query tokens appear in its indicator
    /// list. Ties go to Turkish, then English.
    pub fn detect(query: &str) -> Self {
        let tokens = tokenize(query);
        let score = |indicators: &[&str]| {
            tokens
                .iter()
                .filter(|token| indicators.contains(&token.as_str()))
                .count()
        };
        let turkish = score(TURKISH_INDICATORS);
        let english = score(ENGLISH_INDICATORS);
        let italian = score(ITALIAN_INDICATORS);

        if turkish >= english && turkish >= italian {
            Language::Turkish
        } else if english >= italian {
            Language::English
        } else {
            Language::Italian
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Turkish => "turkish",
            Language::English => "english",
            Language::Italian => "italian",
        }
    }

    /// Shown when there is nothing to answer from: an empty query, a greeting,
    /// an off-topic question or an empty search result.
    pub fn no_information_message(&self) -> &'static str {
        match self {
            Language::Turkish => {
                "Üzgünüm, bu soruyla ilgili belgelerde bilgi bulamadım. \
                 Lütfen AMIF hibe programları hakkında bir soru sorun."
            }
            Language::English => {
                "Sorry, I could not find any information about this in the grant documents. \
                 Please ask a question about the AMIF grant programmes."
            }
            Language::Italian => {
                "Mi dispiace, non ho trovato informazioni su questo nei documenti. \
                 Per favore, fai una domanda sui programmi di sovvenzione AMIF."
            }
        }
    }

    pub fn sources_heading(&self) -> &'static str {
        match self {
            Language::Turkish => "**Kaynaklar:**",
            Language::English => "**Sources:**",
            Language::Italian => "**Fonti:**",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
