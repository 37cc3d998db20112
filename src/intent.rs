//! Deterministic query intent classification.
//!
//! An ordered table of category patterns is evaluated first-match-wins;
//! the order is a tie-break policy, not an implementation detail.

use crate::query;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// The query names a specific application or asset.
    Specific,
    /// The query matched one of the category patterns.
    Category,
    /// The query asks for a capability via an action verb.
    Feature,
    /// Nothing recognizable; fall back to broad matching.
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
    pub intent: String,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    pub search_type: SearchType,
}

lazy_static! {
    /// First match wins. Finance before Security matters for queries like
    /// "secure payment app".
    static ref CATEGORY_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"finance|money|payment|banking|invoice|account").unwrap(), "Finance"),
        (Regex::new(r"security|privacy|encrypt|protect").unwrap(), "Security"),
        (Regex::new(r"productivity|work|task|project|organize").unwrap(), "Productivity"),
        (Regex::new(r"entertainment|music|game|video|stream").unwrap(), "Entertainment"),
    ];
    static ref ACTION_VERBS: Regex = Regex::new(r"\b(find|show|get|need)\b").unwrap();
    static ref SUPERLATIVE: Regex = Regex::new(r"\b(best|top)\b").unwrap();
    static ref COLLABORATION: Regex = Regex::new(r"\b(team|collaborat\w*|share|sharing)\b").unwrap();
}

/// Classify a raw query. Always returns a value; there is no failure mode.
pub fn classify(raw_query: &str) -> QueryIntent {
    let lowered = raw_query.to_lowercase();
    let keywords = query::keywords(raw_query);

    for (pattern, category) in CATEGORY_RULES.iter() {
        if pattern.is_match(&lowered) {
            return QueryIntent {
                intent: format!("Looking for {} applications", category),
                category: Some((*category).to_string()),
                keywords,
                search_type: SearchType::Category,
            };
        }
    }

    let intent = if SUPERLATIVE.is_match(&lowered) {
        "Find the top rated applications".to_string()
    } else if COLLABORATION.is_match(&lowered) {
        "Find team collaboration tools".to_string()
    } else {
        "Find relevant applications".to_string()
    };

    let search_type = if ACTION_VERBS.is_match(&lowered) {
        SearchType::Feature
    } else {
        SearchType::General
    };

    QueryIntent {
        intent,
        category: None,
        keywords,
        search_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_match_wins() {
        let intent = classify("show me payment tracking apps");
        assert_eq!(intent.category.as_deref(), Some("Finance"));
        assert_eq!(intent.search_type, SearchType::Category);
        assert!(intent.intent.contains("Finance"));
    }

    #[test]
    fn test_category_order_is_first_match() {
        // Matches both Finance ("payment") and Security ("privacy");
        // the ordered table picks Finance first.
        let intent = classify("payment privacy tools");
        assert_eq!(intent.category.as_deref(), Some("Finance"));
    }

    #[test]
    fn test_action_verb_yields_feature_search() {
        let intent = classify("find something for notes");
        assert_eq!(intent.category, None);
        assert_eq!(intent.search_type, SearchType::Feature);
    }

    #[test]
    fn test_superlative_phrasing() {
        let intent = classify("best tools available");
        assert_eq!(intent.intent, "Find the top rated applications");
        assert_eq!(intent.search_type, SearchType::General);
    }

    #[test]
    fn test_default_intent() {
        let intent = classify("dashboards");
        assert_eq!(intent.intent, "Find relevant applications");
        assert_eq!(intent.search_type, SearchType::General);
        assert_eq!(intent.keywords, vec!["dashboards"]);
    }
}
