//! News search backed by the Tavily Search API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use cr_core::{ArticleRecord, Error, NewsSearch, SearchOutcome};

pub const TAVILY_BASE_URL: &str = "https://api.tavily.com";

/// Default timeout for Tavily API requests
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound the API accepts for `max_results`
const MAX_RESULTS_LIMIT: usize = 20;

pub struct TavilyNewsSearch {
    api_key: String,
    client: Client,
    base_url: String,
}

impl TavilyNewsSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: TAVILY_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Request body for Tavily API
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    topic: &'static str,
    search_depth: &'static str,
}

/// Response from Tavily API
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl From<TavilyResult> for ArticleRecord {
    fn from(result: TavilyResult) -> Self {
        ArticleRecord {
            url: result.url.unwrap_or_default(),
            title: result.title,
            content: result.content.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl NewsSearch for TavilyNewsSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome, Error> {
        let request = TavilyRequest {
            query,
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
            topic: "news",
            search_depth: "basic",
        };
        debug!(query, max_results = request.max_results, "Tavily news search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::search(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match status.as_u16() {
                401 => "Unauthorized - check API key".to_string(),
                429 => "Rate limited - too many requests".to_string(),
                _ => format!("HTTP error {}: {}", status, body),
            };
            warn!(query, status = status.as_u16(), "Tavily search returned an error");
            return Ok(SearchOutcome::Failed(message));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| Error::serialization(format!("Failed to parse search response: {}", e)))?;

        let articles: Vec<ArticleRecord> = body
            .results
            .into_iter()
            .take(max_results)
            .map(ArticleRecord::from)
            .collect();
        debug!(query, results = articles.len(), "Tavily search finished");

        Ok(SearchOutcome::Articles(articles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_response() -> serde_json::Value {
        serde_json::json!({
            "query": "Acme",
            "results": [
                {
                    "title": "Acme raises funding",
                    "url": "https://news.test/acme-funding",
                    "content": "Acme announced a new funding round.",
                    "score": 0.92
                },
                {
                    "title": "Acme hires",
                    "url": "https://news.test/acme-hires",
                    "score": 0.5
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_search_returns_articles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "query": "Acme",
                "topic": "news",
                "max_results": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let search = TavilyNewsSearch::new("test-key").with_base_url(server.uri());
        let outcome = search.search("Acme", 3).await.unwrap();

        let SearchOutcome::Articles(articles) = outcome else {
            panic!("expected articles, got {:?}", outcome);
        };
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title.as_deref(), Some("Acme raises funding"));
        assert!(articles[0].is_eligible());
        // Missing content deserializes to empty and is not eligible
        assert!(!articles[1].is_eligible());
    }

    #[tokio::test]
    async fn test_search_respects_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let search = TavilyNewsSearch::new("test-key").with_base_url(server.uri());
        let outcome = search.search("Acme", 1).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Articles(ref a) if a.len() == 1));
    }

    #[tokio::test]
    async fn test_http_error_is_error_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let search = TavilyNewsSearch::new("bad-key").with_base_url(server.uri());
        let outcome = search.search("Acme", 3).await.unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Failed("Unauthorized - check API key".to_string())
        );
    }

    #[tokio::test]
    async fn test_server_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let search = TavilyNewsSearch::new("test-key").with_base_url(server.uri());
        let outcome = search.search("Acme", 3).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Failed(ref m) if m.contains("upstream down")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let search = TavilyNewsSearch::new("test-key").with_base_url(server.uri());
        assert!(search.search("Acme", 3).await.is_err());
    }
}
