//! Conversational layer: the provider interface, the generative and local
//! implementations, and the fallback orchestrator that keeps answers
//! available when the generative backend fails.

pub mod gemini;
pub mod local;

use crate::catalog::Catalog;
use crate::discovery::{self, DiscoveryResponse};
use crate::error::ProviderError;
use crate::intent::QueryIntent;
use crate::scoring::ScoredResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub use gemini::GeminiProvider;
pub use local::LocalProvider;

/// Maximum entity references carried on a response.
const MAX_REFERENCED_ENTITIES: usize = 5;
/// Suggested follow-up queries on a normal response.
pub(crate) const MAX_FOLLOW_UPS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub answer: String,
    /// Ids of catalog entities the answer refers to, at most 5.
    pub referenced_entities: Vec<String>,
    pub suggested_queries: Vec<String>,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl AiResponse {
    /// Last-resort response when even the local provider errored. Every
    /// code path must produce a well-formed structure.
    fn unavailable() -> Self {
        Self {
            answer: "The assistant is temporarily unavailable. The ranked search results above are still valid.".to_string(),
            referenced_entities: Vec::new(),
            suggested_queries: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Entity ids for the top ranked results, capped at 5.
pub(crate) fn referenced_entities(ranked: &[ScoredResult]) -> Vec<String> {
    ranked
        .iter()
        .take(MAX_REFERENCED_ENTITIES)
        .map(|r| r.entity.id.clone())
        .collect()
}

/// Deterministic welcome answer shared by both providers: catalog stats,
/// confidence 1.0, exactly four suggested queries.
pub(crate) fn welcome_response(catalog: &Catalog) -> AiResponse {
    let categories = catalog.categories();
    let answer = format!(
        "Welcome! This catalog covers {} applications, {} data sources, {} tables and {} columns across {} categories. \
         Ask about anything in it, for example which tables hold customer data or which apps handle invoicing.",
        catalog.applications.len(),
        catalog.data_sources.len(),
        catalog.tables.len(),
        catalog.column_count(),
        categories.len(),
    );

    AiResponse {
        answer,
        referenced_entities: Vec::new(),
        suggested_queries: vec![
            "Show me finance applications".to_string(),
            "Which tables contain sensitive data?".to_string(),
            "What data sources does marketing own?".to_string(),
            "Find credit card data".to_string(),
        ],
        confidence: 1.0,
    }
}

/// Interface both backends implement, so the orchestrator can hold a
/// reference to the current provider uniformly.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Conversational answer conditioned on the ranked discovery results.
    async fn respond(
        &self,
        query: &str,
        catalog: &Catalog,
        ranked: &[ScoredResult],
    ) -> Result<AiResponse, ProviderError>;

    /// Up to five query suggestions for the given input.
    async fn suggest_queries(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Vec<String>, ProviderError>;

    async fn classify_intent(&self, query: &str) -> Result<QueryIntent, ProviderError>;

    /// Greeting for an empty query, confidence 1.0.
    async fn welcome(&self, catalog: &Catalog) -> Result<AiResponse, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Combined reply from the top-level ask flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub request_id: String,
    pub discovery: DiscoveryResponse,
    pub ai: AiResponse,
    /// True when the reply came from the local deterministic backend.
    pub degraded: bool,
}

/// Fallback orchestrator. Starts in PRIMARY and answers through the
/// generative provider; the first surfaced provider failure demotes the
/// whole session to DEGRADED, where the local provider answers directly.
/// There is no automatic recovery: only [`DataAssistant::retry_with_gemini`]
/// or [`DataAssistant::set_use_gemini`] moves the state back.
pub struct DataAssistant {
    catalog: Arc<Catalog>,
    primary: Arc<dyn AiProvider>,
    local: Arc<dyn AiProvider>,
    degraded: AtomicBool,
}

impl DataAssistant {
    pub fn new(
        catalog: Arc<Catalog>,
        primary: Arc<dyn AiProvider>,
        local: Arc<dyn AiProvider>,
    ) -> Self {
        Self {
            catalog,
            primary,
            local,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Manual reset back to the generative backend.
    pub fn retry_with_gemini(&self) {
        info!("resetting assistant to the generative backend");
        self.degraded.store(false, Ordering::SeqCst);
    }

    /// Manual toggle; `false` pins the assistant to the local backend.
    pub fn set_use_gemini(&self, enabled: bool) {
        self.degraded.store(!enabled, Ordering::SeqCst);
    }

    fn demote(&self, method: &str, err: &ProviderError) {
        warn!(method, error = %err, "generative backend failed; degrading to local responder");
        self.degraded.store(true, Ordering::SeqCst);
    }

    /// Full flow for one query: discovery, then a conversational answer
    /// conditioned on the ranked results. An empty query yields the
    /// welcome response instead.
    pub async fn ask(&self, query: &str) -> AssistantReply {
        let request_id = Uuid::new_v4().to_string();

        let discovery = discovery::discover(query, &self.catalog);
        let ai = if query.trim().is_empty() {
            self.welcome().await
        } else {
            self.respond(query, &discovery.suggestions).await
        };

        AssistantReply {
            request_id,
            discovery,
            ai,
            degraded: self.is_degraded(),
        }
    }

    /// Never surfaces a provider failure; the worst case is the local
    /// answer, and after that a fixed unavailable response.
    pub async fn respond(&self, query: &str, ranked: &[ScoredResult]) -> AiResponse {
        if !self.is_degraded() {
            match self.primary.respond(query, &self.catalog, ranked).await {
                Ok(response) => return response,
                Err(err) => self.demote("respond", &err),
            }
        }
        self.local
            .respond(query, &self.catalog, ranked)
            .await
            .unwrap_or_else(|_| AiResponse::unavailable())
    }

    pub async fn classify_intent(&self, query: &str) -> QueryIntent {
        if !self.is_degraded() {
            match self.primary.classify_intent(query).await {
                Ok(intent) => return intent,
                Err(err) => self.demote("classify_intent", &err),
            }
        }
        match self.local.classify_intent(query).await {
            Ok(intent) => intent,
            Err(_) => crate::intent::classify(query),
        }
    }

    pub async fn suggest_queries(&self, query: &str) -> Vec<String> {
        if !self.is_degraded() {
            match self.primary.suggest_queries(query, &self.catalog).await {
                Ok(suggestions) => return suggestions,
                Err(err) => self.demote("suggest_queries", &err),
            }
        }
        self.local
            .suggest_queries(query, &self.catalog)
            .await
            .unwrap_or_default()
    }

    pub async fn welcome(&self) -> AiResponse {
        if !self.is_degraded() {
            match self.primary.welcome(&self.catalog).await {
                Ok(response) => return response,
                Err(err) => self.demote("welcome", &err),
            }
        }
        self.local
            .welcome(&self.catalog)
            .await
            .unwrap_or_else(|_| AiResponse::unavailable())
    }

    pub fn active_provider_name(&self) -> &'static str {
        if self.is_degraded() {
            self.local.name()
        } else {
            self.primary.name()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::sync::atomic::AtomicUsize;

    struct FailingProvider {
        calls: AtomicUsize,
    }

    impl FailingProvider {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record(&self) -> ProviderError {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProviderError::Network("connection refused".to_string())
        }
    }

    #[async_trait]
    impl AiProvider for FailingProvider {
        async fn respond(
            &self,
            _query: &str,
            _catalog: &Catalog,
            _ranked: &[ScoredResult],
        ) -> Result<AiResponse, ProviderError> {
            Err(self.record())
        }

        async fn suggest_queries(
            &self,
            _query: &str,
            _catalog: &Catalog,
        ) -> Result<Vec<String>, ProviderError> {
            Err(self.record())
        }

        async fn classify_intent(&self, _query: &str) -> Result<QueryIntent, ProviderError> {
            Err(self.record())
        }

        async fn welcome(&self, _catalog: &Catalog) -> Result<AiResponse, ProviderError> {
            Err(self.record())
        }

        fn name(&self) -> &'static str {
            "failing-stub"
        }
    }

    fn assistant_with_failing_primary() -> (DataAssistant, Arc<FailingProvider>) {
        let primary = Arc::new(FailingProvider::new());
        let assistant = DataAssistant::new(
            Arc::new(Catalog::default()),
            primary.clone(),
            Arc::new(LocalProvider::instant()),
        );
        (assistant, primary)
    }

    #[tokio::test]
    async fn test_single_failure_demotes_to_degraded() {
        let (assistant, primary) = assistant_with_failing_primary();
        assert!(!assistant.is_degraded());

        let response = assistant.respond("finance apps", &[]).await;
        assert!(assistant.is_degraded());
        assert_eq!(primary.call_count(), 1);
        // The caller still got a well-formed answer, from the local backend.
        assert!(!response.answer.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_mode_bypasses_primary_until_reset() {
        let (assistant, primary) = assistant_with_failing_primary();

        assistant.respond("first", &[]).await;
        assert_eq!(primary.call_count(), 1);

        assistant.respond("second", &[]).await;
        assistant.classify_intent("third").await;
        assistant.suggest_queries("fourth").await;
        assert_eq!(primary.call_count(), 1, "degraded mode must bypass the primary");

        assistant.retry_with_gemini();
        assert!(!assistant.is_degraded());
        assistant.respond("fifth", &[]).await;
        assert_eq!(primary.call_count(), 2);
    }

    #[tokio::test]
    async fn test_set_use_gemini_toggle() {
        let (assistant, primary) = assistant_with_failing_primary();

        assistant.set_use_gemini(false);
        assistant.respond("query", &[]).await;
        assert_eq!(primary.call_count(), 0);

        assistant.set_use_gemini(true);
        assistant.respond("query", &[]).await;
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ask_with_empty_query_returns_welcome() {
        let (assistant, _primary) = assistant_with_failing_primary();

        let reply = assistant.ask("").await;
        assert!(reply.discovery.suggestions.is_empty());
        assert!((reply.ai.confidence - 1.0).abs() < 1e-9);
        assert_eq!(reply.ai.suggested_queries.len(), 4);
    }
}
