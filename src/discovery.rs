//! Discovery orchestration: fan a query out across every entity kind,
//! merge and rank the results, and derive alternative queries and
//! compliance warnings from what came back.

use crate::catalog::Catalog;
use crate::intent::{self, QueryIntent};
use crate::scoring::{self, EntityKind, MatchType, QueryContext, ScoredResult};
use crate::sensitive::SensitiveDataType;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use tracing::debug;

/// Hard cap on ranked suggestions returned to the caller.
const MAX_SUGGESTIONS: usize = 10;
const MAX_ALTERNATIVE_QUERIES: usize = 5;
/// Alternative queries this close to the original are noise, not help.
const ALTERNATIVE_SIMILARITY_CEILING: f64 = 0.92;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub query: String,
    pub intent: QueryIntent,
    pub suggestions: Vec<ScoredResult>,
    pub alternative_queries: Vec<String>,
    pub warnings: Vec<String>,
}

/// Run the full discovery flow for one query against a loaded catalog.
///
/// Applications, data sources, tables and columns are scored in catalog
/// order; the sort is stable so ties keep discovery order and identical
/// input always produces the identical ranked list.
pub fn discover(raw_query: &str, catalog: &Catalog) -> DiscoveryResponse {
    let query_intent = intent::classify(raw_query);

    if raw_query.trim().is_empty() {
        return DiscoveryResponse {
            query: raw_query.to_string(),
            intent: query_intent,
            suggestions: Vec::new(),
            alternative_queries: Vec::new(),
            warnings: Vec::new(),
        };
    }

    let ctx = QueryContext::analyze(raw_query);
    let mut results: Vec<ScoredResult> = Vec::new();

    for app in &catalog.applications {
        results.extend(scoring::score_application(app, &ctx));
    }
    for ds in &catalog.data_sources {
        results.extend(scoring::score_data_source(ds, &ctx));
    }
    for table in &catalog.tables {
        results.extend(scoring::score_table(table, &ctx));
    }
    for table in &catalog.tables {
        for column in &table.columns {
            results.extend(scoring::score_column(table, column, &ctx));
        }
    }

    debug!(
        matched = results.len(),
        terms = ctx.terms.len(),
        "scored catalog for query"
    );

    // Stable: ties keep first-encountered catalog order.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(MAX_SUGGESTIONS);

    let warnings = build_warnings(&results);
    let alternative_queries = alternative_queries(raw_query, &ctx);

    DiscoveryResponse {
        query: raw_query.to_string(),
        intent: query_intent,
        suggestions: results,
        alternative_queries,
        warnings,
    }
}

/// Fixed phrase-substitution rules keyed on the detected signals. These are
/// generated from the query alone, never from the scored results.
fn alternative_queries(raw_query: &str, ctx: &QueryContext) -> Vec<String> {
    let lowered = raw_query.to_lowercase();

    let candidates: Vec<String> = if lowered.contains("credit card") {
        vec![
            "payment card data".to_string(),
            "cardholder information".to_string(),
            "billing and transactions".to_string(),
            "customer payment methods".to_string(),
            "tables with card numbers".to_string(),
        ]
    } else if ctx.sensitive_types.contains(&SensitiveDataType::Ssn) {
        vec![
            "social security data".to_string(),
            "identity records".to_string(),
            "government id fields".to_string(),
            "customer identity tables".to_string(),
            "PII columns".to_string(),
        ]
    } else {
        match intent::classify(raw_query).category.as_deref() {
            Some("Finance") => vec![
                "expense tracking".to_string(),
                "invoice management".to_string(),
                "payment processing".to_string(),
                "budgeting tools".to_string(),
                "financial reporting".to_string(),
            ],
            Some("Security") => vec![
                "access control".to_string(),
                "audit logging".to_string(),
                "encrypted storage".to_string(),
                "credential management".to_string(),
                "compliance tooling".to_string(),
            ],
            Some("Productivity") => vec![
                "task management".to_string(),
                "team workspaces".to_string(),
                "document collaboration".to_string(),
                "project tracking".to_string(),
                "scheduling tools".to_string(),
            ],
            Some("Entertainment") => vec![
                "media streaming".to_string(),
                "music libraries".to_string(),
                "gaming platforms".to_string(),
                "video content".to_string(),
                "recommendation engines".to_string(),
            ],
            _ => ctx
                .terms
                .first()
                .map(|term| {
                    vec![
                        format!("{} applications", term),
                        format!("{} data sources", term),
                        format!("tables containing {}", term),
                        format!("{} reports", term),
                    ]
                })
                .unwrap_or_default(),
        }
    };

    candidates
        .into_iter()
        .filter(|alt| jaro_winkler(&alt.to_lowercase(), &lowered) < ALTERNATIVE_SIMILARITY_CEILING)
        .unique()
        .take(MAX_ALTERNATIVE_QUERIES)
        .collect()
}

/// Warnings derived from the ranked suggestions, in fixed order:
/// sensitivity, confidence, PCI. A warning whose condition is false is
/// omitted entirely.
fn build_warnings(suggestions: &[ScoredResult]) -> Vec<String> {
    let mut warnings = Vec::new();

    let sensitive_count = suggestions.iter().filter(|r| r.sensitive).count();
    if sensitive_count > 0 {
        warnings.push(format!(
            "{} matched asset(s) contain sensitive data; access requires PII authorization.",
            sensitive_count
        ));
    }

    if !suggestions.iter().any(|r| r.match_type == MatchType::Exact) {
        warnings.push(
            "No exact matches found; results are ranked on weaker relevance signals.".to_string(),
        );
    }

    let has_payment_column = suggestions.iter().any(|r| {
        r.entity.kind == EntityKind::Column && {
            let name = r.entity.name.to_lowercase();
            name.contains("card") || name.contains("payment") || name.contains("cc_")
        }
    });
    if has_payment_column {
        warnings.push(
            "Results include payment-card columns; PCI-DSS controls apply before querying them."
                .to_string(),
        );
    }

    warnings
}

/// One hit from the plain relevance search path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub application_id: String,
    pub name: String,
    pub category: String,
    /// Normalized to [0, 1].
    pub score: f64,
}

/// Categories that get a flat popularity bonus in the plain search path.
const POPULAR_CATEGORIES: &[&str] = &["Finance", "Productivity", "Communication", "Analytics"];

const SEARCH_SCORE_DIVISOR: f64 = 10.0;
const SEARCH_SCORE_FLOOR: f64 = 0.1;
const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Simple bounded-relevance search over applications only, used outside
/// the full discovery flow. Scores are normalized to [0, 1]; sums above
/// the divisor clamp to 1.0 by design.
pub fn search(raw_query: &str, catalog: &Catalog, limit: Option<usize>) -> Vec<SearchHit> {
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let phrase = crate::query::normalize(raw_query);
    let terms = crate::query::extract_terms(raw_query);

    if phrase.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = Vec::new();
    for app in &catalog.applications {
        let name = app.name.to_lowercase();
        let category = app.category.to_lowercase();
        let description = app.description.to_lowercase();

        let mut raw = 0.0;
        if name.contains(&phrase) {
            raw += 10.0;
        }
        if category.contains(&phrase) {
            raw += 5.0;
        }
        if description.contains(&phrase) {
            raw += 3.0;
        }
        for term in &terms {
            if name.contains(term) {
                raw += 2.0;
            }
            if category.contains(term) {
                raw += 1.5;
            }
            if description.contains(term) {
                raw += 1.0;
            }
        }
        if POPULAR_CATEGORIES.iter().any(|c| c.eq_ignore_ascii_case(&app.category)) {
            raw += 0.5;
        }

        let score = (raw / SEARCH_SCORE_DIVISOR).min(1.0);
        if score >= SEARCH_SCORE_FLOOR {
            hits.push(SearchHit {
                application_id: app.id.clone(),
                name: app.name.clone(),
                category: app.category.clone(),
                score,
            });
        }
    }

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Application, Column, Table};

    fn app(id: &str, name: &str, category: &str, description: &str) -> Application {
        Application {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            tags: vec![],
            technologies: vec![],
            data_source_ids: vec![],
            environment: "production".to_string(),
        }
    }

    fn finance_catalog() -> Catalog {
        let apps = (1..=5)
            .map(|i| {
                app(
                    &format!("app-{}", i),
                    &format!("Ledger {}", i),
                    "Finance",
                    "Track balances and spending",
                )
            })
            .collect();
        Catalog::new(apps, vec![], vec![])
    }

    fn card_catalog() -> Catalog {
        Catalog::new(
            vec![],
            vec![],
            vec![Table {
                id: "tbl-customers".to_string(),
                name: "customers".to_string(),
                description: "Customer master records".to_string(),
                tags: vec![],
                schema_name: "public".to_string(),
                data_source_id: "ds-crm".to_string(),
                sensitive: false,
                columns: vec![Column {
                    id: "col-card".to_string(),
                    name: "card_number".to_string(),
                    description: "Payment card number".to_string(),
                    tags: vec![],
                    data_type: "varchar".to_string(),
                    nullable: true,
                    primary_key: false,
                    sensitive: true,
                }],
            }],
        )
    }

    #[test]
    fn test_suggestions_are_capped_and_sorted() {
        let apps = (0..25)
            .map(|i| app(&format!("a{}", i), &format!("Invoice App {}", i), "Finance", "invoices"))
            .collect();
        let catalog = Catalog::new(apps, vec![], vec![]);

        let response = discover("invoice", &catalog);
        assert!(response.suggestions.len() <= 10);
        for pair in response.suggestions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = finance_catalog();
        let response = discover("balances", &catalog);

        let ids: Vec<&str> = response.suggestions.iter().map(|r| r.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["app-1", "app-2", "app-3", "app-4", "app-5"]);
    }

    #[test]
    fn test_discover_is_idempotent() {
        let catalog = card_catalog();
        let first = discover("credit card", &catalog);
        let second = discover("credit card", &catalog);

        let first_ids: Vec<_> = first.suggestions.iter().map(|r| r.entity.id.clone()).collect();
        let second_ids: Vec<_> = second.suggestions.iter().map(|r| r.entity.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.alternative_queries, second.alternative_queries);
    }

    #[test]
    fn test_credit_card_query_warnings_and_order() {
        let catalog = card_catalog();
        let response = discover("credit card", &catalog);

        assert!(response
            .suggestions
            .iter()
            .any(|r| r.entity.name == "card_number" && r.match_type == MatchType::Exact));

        // Sensitivity warning first, PCI warning after; no low-confidence
        // warning because an exact match exists.
        assert_eq!(response.warnings.len(), 2);
        assert!(response.warnings[0].contains("PII authorization"));
        assert!(response.warnings[1].contains("PCI-DSS"));
    }

    #[test]
    fn test_no_match_emits_low_confidence_warning() {
        let catalog = finance_catalog();
        let response = discover("weather satellites", &catalog);

        assert!(response.suggestions.is_empty());
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("No exact matches"));
    }

    #[test]
    fn test_empty_query_is_fully_empty() {
        let catalog = finance_catalog();
        let response = discover("   ", &catalog);

        assert!(response.suggestions.is_empty());
        assert!(response.warnings.is_empty());
        assert!(response.alternative_queries.is_empty());
    }

    #[test]
    fn test_credit_card_alternatives_are_fixed() {
        let catalog = card_catalog();
        let response = discover("credit card", &catalog);
        assert_eq!(response.alternative_queries.len(), 5);
        assert!(response.alternative_queries.contains(&"payment card data".to_string()));
    }

    #[test]
    fn test_search_normalizes_and_limits() {
        let catalog = finance_catalog();
        let hits = search("finance", &catalog, Some(2));

        // Five Finance apps with no literal "finance" in name/description:
        // category phrase +5, category term +1.5, popular bonus +0.5 = 0.7.
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!(hit.score <= 1.0);
            assert!((hit.score - 0.7).abs() < 1e-9);
        }
    }

    #[test]
    fn test_search_clamps_to_one() {
        let catalog = Catalog::new(
            vec![app("a1", "Invoice Invoices", "Invoice", "invoice invoice invoice")],
            vec![],
            vec![],
        );
        let hits = search("invoice", &catalog, None);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_search_drops_below_floor() {
        let catalog = Catalog::new(
            vec![app("a1", "Notes", "Utilities", "plain note taking")],
            vec![],
            vec![],
        );
        // Only signal would be the popularity bonus, and "Utilities" is not
        // in the popular list; nothing crosses the floor.
        let hits = search("finance", &catalog, None);
        assert!(hits.is_empty());
    }
}
