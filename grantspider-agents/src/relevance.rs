use crate::language::tokenize;

const GREETINGS: &[&str] = &[
    // Turkish
    "merhaba", "hey", "selam", "nasılsın", "nasıl gidiyor", "günaydın", "iyi akşamlar",
    "teşekkürler", "sağol", "hoşça kal", "görüşürüz", "naber", "ne var ne yok",
    // English
    "hello", "hi", "how are you", "how is it going", "good morning", "good evening",
    "thank you", "thanks", "goodbye", "see you", "what's up", "how's life",
];

const GRANT_KEYWORDS: &[&str] = &[
    "grant", "hibe", "amif", "proje", "project", "başvuru", "application", "finansman",
    "funding", "bütçe", "budget", "maliyet", "cost", "personel", "personnel", "eligibility",
    "uygunluk", "criteria", "kriter", "document", "belge", "requirement", "guideline",
    "procedure",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relevance {
    Accepted,
    /// Fewer than three words and a greeting phrase.
    Greeting,
    /// Fewer than five words and no grant keyword.
    TooShort,
}

impl Relevance {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Relevance::Accepted)
    }
}

fn contains_grant_keyword(query: &str) -> bool {
    let lowered = query.to_lowercase();
    GRANT_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Phrases match on whole words, so "hi" does not fire inside "which".
fn contains_greeting(tokens: &[String]) -> bool {
    let padded = format!(" {} ", tokens.join(" "));
    GREETINGS.iter().any(|greeting| {
        let phrase = tokenize(greeting).join(" ");
        padded.contains(&format!(" {phrase} "))
    })
}

/// Word counts split on whitespace only, so "what's" is one word.
fn word_count(query: &str) -> usize {
    query.split_whitespace().count()
}

/// Short small-talk: under three words and containing a greeting phrase.
pub fn is_greeting(query: &str) -> bool {
    word_count(query) < 3 && contains_greeting(&tokenize(query))
}

/// Grant keywords always win, regardless of length.
pub fn assess_relevance(query: &str) -> Relevance {
    if contains_grant_keyword(query) {
        return Relevance::Accepted;
    }
    let words = word_count(query);
    if words < 3 && contains_greeting(&tokenize(query)) {
        return Relevance::Greeting;
    }
    if words < 5 {
        return Relevance::TooShort;
    }
    Relevance::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_are_rejected() {
        assert_eq!(assess_relevance("Merhaba"), Relevance::Greeting);
        assert_eq!(assess_relevance("hello there"), Relevance::Greeting);
        assert_eq!(assess_relevance("Thanks!"), Relevance::Greeting);
    }

    #[test]
    fn grant_keywords_are_always_accepted() {
        assert_eq!(assess_relevance("hibe"), Relevance::Accepted);
        assert_eq!(assess_relevance("hi grant"), Relevance::Accepted);
        assert_eq!(assess_relevance("AMIF?"), Relevance::Accepted);
        assert_eq!(assess_relevance("Which budget?"), Relevance::Accepted);
    }

    #[test]
    fn short_off_topic_queries_are_rejected() {
        assert_eq!(assess_relevance("weather today"), Relevance::TooShort);
        assert_eq!(assess_relevance("tell me a joke"), Relevance::TooShort);
    }

    #[test]
    fn long_queries_are_accepted_by_default() {
        assert_eq!(
            assess_relevance("who can take part in the integration call"),
            Relevance::Accepted
        );
    }

    #[test]
    fn greeting_match_needs_whole_words() {
        assert!(!is_greeting("which one"));
        assert!(is_greeting("hi"));
        assert!(is_greeting("good morning"));
        assert!(!is_greeting("good morning to everyone here"));
    }

    #[test]
    fn contractions_count_as_one_word() {
        assert_eq!(assess_relevance("What's up?"), Relevance::Greeting);
        assert_eq!(assess_relevance("how's life"), Relevance::Greeting);
        assert_eq!(
            assess_relevance("what's the weather today"),
            Relevance::TooShort
        );
        assert_eq!(assess_relevance("well-known tourist spots?"), Relevance::TooShort);
    }

    #[test]
    fn three_word_greeting_falls_through_to_length_rule() {
        // Not a short greeting, but still too short to be a real question.
        assert_eq!(assess_relevance("how are you"), Relevance::TooShort);
    }
}
