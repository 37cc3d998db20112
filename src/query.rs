//! Query normalization and search-term extraction shared by the scorer
//! and the discovery orchestrator.

/// Words carrying no discriminating signal for catalog search. Kept small
/// and fixed so scoring stays reproducible.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were",
    "you", "your", "have", "has", "had", "what", "which", "where", "when",
    "who", "how", "can", "could", "should", "would", "about", "into", "over",
    "all", "any", "some", "not", "our", "their", "them", "they",
    "find", "show", "get", "need", "want", "give", "list", "tell",
];

/// Lower-case a raw query and strip punctuation, preserving word breaks.
pub fn normalize(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the term set used for per-term scoring: lower-cased tokens with
/// punctuation stripped, stop words and short tokens (len <= 2) removed.
/// Order follows the query; duplicates are not significant to scoring.
pub fn extract_terms(query: &str) -> Vec<String> {
    normalize(query)
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Keywords for intent classification: every token longer than 2 chars,
/// stop words included (the classifier wants verbs like "find").
pub fn keywords(query: &str) -> Vec<String> {
    normalize(query)
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Where's   the credit-card data?"), "where s the credit card data");
    }

    #[test]
    fn test_extract_terms_drops_stop_words_and_short_tokens() {
        let terms = extract_terms("Find the credit card apps for me");
        assert_eq!(terms, vec!["credit", "card", "apps"]);
    }

    #[test]
    fn test_keywords_keep_action_verbs() {
        let kw = keywords("find payment apps");
        assert_eq!(kw, vec!["find", "payment", "apps"]);
    }

    #[test]
    fn test_empty_query_yields_no_terms() {
        assert!(extract_terms("").is_empty());
        assert!(extract_terms("   ").is_empty());
        assert!(extract_terms("a an of").is_empty());
    }
}
