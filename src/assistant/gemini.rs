//! Generative provider backed by a Gemini-style `generateContent` HTTP API.
//!
//! Generation failures inside [`GeminiProvider::respond`] are classified
//! and absorbed into fixed, well-formed answers so a flaky backend still
//! yields a usable reply. Failures of the parsing calls
//! (`classify_intent`, `suggest_queries`) surface as [`ProviderError`]s,
//! which is what lets the orchestrator demote the session.

use super::{referenced_entities, welcome_response, AiProvider, AiResponse, MAX_FOLLOW_UPS};
use crate::catalog::{Application, Catalog};
use crate::config::AssistantConfig;
use crate::error::{DiscoveryError, ProviderError};
use crate::intent::{QueryIntent, SearchType};
use crate::scoring::{EntityKind, ScoredResult};
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// Top-ranked applications included in the prompt context.
const MAX_CONTEXT_APPS: usize = 8;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &AssistantConfig) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DiscoveryError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Authorization("GEMINI_API_KEY is not set".to_string()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Authorization(format!(
                "backend rejected the request with {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Other(format!("backend returned {}", status)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Other(format!("unreadable response body: {}", e)))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Other("no candidate text in response".to_string()))
    }

    fn ranked_applications<'a>(
        &self,
        catalog: &'a Catalog,
        ranked: &[ScoredResult],
    ) -> Vec<&'a Application> {
        ranked
            .iter()
            .filter(|r| r.entity.kind == EntityKind::Application)
            .filter_map(|r| catalog.application(&r.entity.id))
            .take(MAX_CONTEXT_APPS)
            .collect()
    }

    fn build_context(&self, catalog: &Catalog, apps: &[&Application]) -> String {
        let mut context = format!(
            "The catalog holds {} entities. Application categories: {}.\n",
            catalog.total_entities(),
            catalog.categories().join(", "),
        );
        if !apps.is_empty() {
            context.push_str("Top ranked applications for this query:\n");
            for app in apps {
                context.push_str(&format!(
                    "- {} ({}): {}\n",
                    app.name, app.category, app.description
                ));
            }
        }
        context
    }

    fn respond_prompt(&self, query: &str, context: &str) -> String {
        format!(
            "You are a data discovery assistant for an enterprise catalog.\n\n\
             Context:\n{}\n\
             User query: \"{}\"\n\n\
             Answer in 2-3 concise, professional paragraphs. Reference concrete \
             applications or tables from the context where relevant, and mention \
             compliance constraints if the query touches sensitive data.",
            context, query
        )
    }

    fn follow_up_queries(&self, apps: &[&Application]) -> Vec<String> {
        let mut suggestions: Vec<String> = apps
            .iter()
            .map(|a| format!("Show me more {} applications", a.category))
            .unique()
            .collect();
        for generic in [
            "What data sources are available?",
            "Which tables contain sensitive data?",
            "Give me an overview of the catalog",
        ] {
            if suggestions.len() >= MAX_FOLLOW_UPS {
                break;
            }
            if !suggestions.iter().any(|s| s == generic) {
                suggestions.push(generic.to_string());
            }
        }
        suggestions.truncate(MAX_FOLLOW_UPS);
        suggestions
    }

    /// Fixed, well-formed answers for classified generation failures.
    fn failure_response(&self, err: &ProviderError, suggestions: Vec<String>) -> AiResponse {
        match err {
            ProviderError::Network(_) => AiResponse {
                answer: "I couldn't reach the generative AI backend, so there is no narrative \
                         answer this time. The ranked results were computed locally and remain \
                         reliable."
                    .to_string(),
                referenced_entities: Vec::new(),
                suggested_queries: suggestions,
                confidence: 0.8,
            },
            ProviderError::Authorization(_) => AiResponse {
                answer: "The generative AI backend rejected the request. Check that a valid \
                         GEMINI_API_KEY is configured to enable AI answers."
                    .to_string(),
                referenced_entities: Vec::new(),
                suggested_queries: suggestions,
                confidence: 0.1,
            },
            ProviderError::Other(message) => AiResponse {
                answer: format!(
                    "The AI backend failed to produce an answer ({}). The ranked results below \
                     were computed locally.",
                    message
                ),
                referenced_entities: Vec::new(),
                suggested_queries: suggestions,
                confidence: 0.1,
            },
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::Network(err.to_string())
    } else {
        ProviderError::Other(err.to_string())
    }
}

/// Confidence inferred from hedging language in the generated text.
fn confidence_from_text(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    if lowered.contains("not sure") || lowered.contains("unclear") {
        0.4
    } else if ["might", "possibly", "perhaps"].iter().any(|w| lowered.contains(w)) {
        0.6
    } else {
        0.8
    }
}

#[derive(Debug, Deserialize)]
struct IntentPayload {
    intent: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    search_type: String,
}

fn parse_search_type(raw: &str) -> Result<SearchType, ProviderError> {
    match raw.trim().to_lowercase().as_str() {
        "specific" => Ok(SearchType::Specific),
        "category" => Ok(SearchType::Category),
        "feature" => Ok(SearchType::Feature),
        "general" => Ok(SearchType::General),
        other => Err(ProviderError::Other(format!("unknown search type: {}", other))),
    }
}

/// The model wraps JSON in markdown fences more often than not.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn respond(
        &self,
        query: &str,
        catalog: &Catalog,
        ranked: &[ScoredResult],
    ) -> Result<AiResponse, ProviderError> {
        let apps = self.ranked_applications(catalog, ranked);
        let context = self.build_context(catalog, &apps);
        let prompt = self.respond_prompt(query, &context);
        let suggestions = self.follow_up_queries(&apps);

        match self.generate(&prompt).await {
            Ok(text) => {
                let confidence = confidence_from_text(&text);
                debug!(confidence, "generative backend answered");
                Ok(AiResponse {
                    answer: text.trim().to_string(),
                    referenced_entities: referenced_entities(ranked),
                    suggested_queries: suggestions,
                    confidence,
                })
            }
            // Absorbed: the caller gets a degraded but well-formed answer.
            Err(err) => Ok(self.failure_response(&err, suggestions)),
        }
    }

    async fn suggest_queries(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> Result<Vec<String>, ProviderError> {
        let prompt = format!(
            "Suggest up to 5 search queries related to \"{}\" for a data catalog whose \
             application categories are: {}. Return ONLY a JSON array of strings.",
            query,
            catalog.categories().join(", "),
        );
        let text = self.generate(&prompt).await?;
        let suggestions: Vec<String> = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| ProviderError::Other(format!("unparseable suggestions: {}", e)))?;
        Ok(suggestions.into_iter().take(5).collect())
    }

    async fn classify_intent(&self, query: &str) -> Result<QueryIntent, ProviderError> {
        let prompt = format!(
            r#"Classify this data catalog query and return ONLY valid JSON:

Query: "{}"

Format:
{{
  "intent": "one sentence describing what the user wants",
  "category": "Finance|Security|Productivity|Entertainment or null",
  "keywords": ["significant", "terms"],
  "search_type": "specific|category|feature|general"
}}"#,
            query
        );
        let text = self.generate(&prompt).await?;
        let payload: IntentPayload = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| ProviderError::Other(format!("unparseable intent: {}", e)))?;

        Ok(QueryIntent {
            intent: payload.intent,
            category: payload.category.filter(|c| !c.is_empty() && c.as_str() != "null"),
            keywords: payload.keywords,
            search_type: parse_search_type(&payload.search_type)?,
        })
    }

    async fn welcome(&self, catalog: &Catalog) -> Result<AiResponse, ProviderError> {
        // Deterministic: the greeting never needs the model, so this path
        // cannot demote the session.
        Ok(welcome_response(catalog))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(&AssistantConfig::default()).expect("client builds")
    }

    #[test]
    fn test_confidence_heuristic() {
        assert_eq!(confidence_from_text("Use LedgerPro for invoicing."), 0.8);
        assert_eq!(confidence_from_text("LedgerPro might fit."), 0.6);
        assert_eq!(confidence_from_text("I'm not sure which one fits."), 0.4);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[\"a\"]\n```"), "[\"a\"]");
        assert_eq!(strip_code_fences("[\"a\"]"), "[\"a\"]");
    }

    #[test]
    fn test_failure_responses_are_classified() {
        let p = provider();
        let network = p.failure_response(&ProviderError::Network("down".into()), vec![]);
        assert!((network.confidence - 0.8).abs() < 1e-9);

        let auth = p.failure_response(&ProviderError::Authorization("bad key".into()), vec![]);
        assert!((auth.confidence - 0.1).abs() < 1e-9);

        let other = p.failure_response(&ProviderError::Other("boom".into()), vec![]);
        assert!((other.confidence - 0.1).abs() < 1e-9);
        assert!(other.answer.contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_authorization_failure() {
        let p = provider();
        let err = p.generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_respond_absorbs_failures() {
        let p = provider();
        let response = p
            .respond("finance apps", &Catalog::default(), &[])
            .await
            .expect("failure is absorbed");
        assert!((response.confidence - 0.1).abs() < 1e-9);
        assert!(!response.answer.is_empty());
    }

    #[test]
    fn test_parse_search_type_rejects_unknown() {
        assert!(parse_search_type("category").is_ok());
        assert!(parse_search_type("banana").is_err());
    }
}
