//! Deterministic local responder, the drop-in substitute for the
//! generative backend. Answers are template-based and keyed off the
//! category signals in the query; no external call is ever made.

use super::{referenced_entities, welcome_response, AiProvider, AiResponse, MAX_FOLLOW_UPS};
use crate::catalog::Catalog;
use crate::error::ProviderError;
use crate::intent::{self, QueryIntent};
use crate::scoring::ScoredResult;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

const RESPONSE_CONFIDENCE: f64 = 0.85;
/// Latency jitter bounds in milliseconds. Callers built against the
/// network-backed provider expect answers to take a moment; an instant
/// reply reads as broken in interactive surfaces.
const LATENCY_MS: (u64, u64) = (200, 800);

pub struct LocalProvider {
    latency: Option<(u64, u64)>,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self { latency: Some(LATENCY_MS) }
    }

    /// No artificial latency; for tests and batch callers.
    pub fn instant() -> Self {
        Self { latency: None }
    }

    async fn simulate_latency(&self) {
        if let Some((low, high)) = self.latency {
            // Randomness stops here; it never reaches ranking or answers.
            let ms = rand::thread_rng().gen_range(low..=high);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn category_answer(category: &str, top: Option<&ScoredResult>) -> String {
        let lead = match category {
            "Finance" => "The catalog carries several finance assets covering invoicing, payments and reporting.",
            "Security" => "Security-relevant assets in the catalog include access-controlled sources and audited tables.",
            "Productivity" => "For productivity needs the catalog lists collaboration and task-management applications.",
            "Entertainment" => "Media and entertainment assets are a small part of this catalog.",
            _ => "Here is what the catalog search turned up.",
        };
        match top {
            Some(result) => format!(
                "{} The strongest match is {} ({}); the ranked list alongside covers the rest. {}",
                lead,
                result.entity.name,
                result.path,
                if result.sensitive {
                    "Note that the top match is flagged sensitive, so access approval applies."
                } else {
                    "None of this requires special access."
                }
            ),
            None => format!(
                "{} Nothing in the catalog matched this query directly; try one of the suggested rewrites.",
                lead
            ),
        }
    }

    fn suggestions_for(intent: &QueryIntent) -> Vec<String> {
        let mut suggestions = match intent.category.as_deref() {
            Some("Finance") => vec![
                "Show invoice applications".to_string(),
                "Which tables store payment data?".to_string(),
                "Find budgeting tools".to_string(),
            ],
            Some("Security") => vec![
                "Which assets are access controlled?".to_string(),
                "Show audit log tables".to_string(),
                "Find encryption tooling".to_string(),
            ],
            Some("Productivity") => vec![
                "Show collaboration tools".to_string(),
                "Find task trackers".to_string(),
                "Which apps integrate with calendars?".to_string(),
            ],
            Some("Entertainment") => vec![
                "Show media applications".to_string(),
                "Find streaming data sources".to_string(),
                "Which tables hold playback history?".to_string(),
            ],
            _ => vec![
                "Show me finance applications".to_string(),
                "Which tables contain sensitive data?".to_string(),
                "What does the catalog cover?".to_string(),
            ],
        };
        suggestions.push("Give me an overview of the catalog".to_string());
        suggestions.truncate(MAX_FOLLOW_UPS);
        suggestions
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for LocalProvider {
    async fn respond(
        &self,
        query: &str,
        _catalog: &Catalog,
        ranked: &[ScoredResult],
    ) -> Result<AiResponse, ProviderError> {
        self.simulate_latency().await;

        let query_intent = intent::classify(query);
        let category = query_intent.category.as_deref().unwrap_or("");
        let answer = Self::category_answer(category, ranked.first());
        debug!(category, "local responder answered");

        Ok(AiResponse {
            answer,
            referenced_entities: referenced_entities(ranked),
            suggested_queries: Self::suggestions_for(&query_intent),
            confidence: RESPONSE_CONFIDENCE,
        })
    }

    async fn suggest_queries(
        &self,
        query: &str,
        _catalog: &Catalog,
    ) -> Result<Vec<String>, ProviderError> {
        self.simulate_latency().await;
        Ok(Self::suggestions_for(&intent::classify(query)))
    }

    async fn classify_intent(&self, query: &str) -> Result<QueryIntent, ProviderError> {
        self.simulate_latency().await;
        Ok(intent::classify(query))
    }

    async fn welcome(&self, catalog: &Catalog) -> Result<AiResponse, ProviderError> {
        self.simulate_latency().await;
        Ok(welcome_response(catalog))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
