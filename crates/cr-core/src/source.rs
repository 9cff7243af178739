//! Interfaces to the external content sources the pipeline reads from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Text extracted from a single fetched page. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    #[serde(default)]
    pub content: String,
}

impl PageContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// One news search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl ArticleRecord {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            content: content.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Only records carrying both a URL and some content are summarized.
    pub fn is_eligible(&self) -> bool {
        !self.url.is_empty() && !self.content.is_empty()
    }
}

/// Result shape of a news search: either a (possibly empty) list of hits or
/// an error message reported by the search service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Articles(Vec<ArticleRecord>),
    Failed(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its extracted text.
    async fn fetch(&self, url: &str) -> Result<PageContent, Error>;
}

#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Search recent news for `query`, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_eligibility() {
        assert!(ArticleRecord::new("https://news.test/a", "Acme ships").is_eligible());
        assert!(!ArticleRecord::new("", "Acme ships").is_eligible());
        assert!(!ArticleRecord::new("https://news.test/a", "").is_eligible());
    }

    #[test]
    fn test_article_deserialize_missing_fields() {
        let record: ArticleRecord = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(record.title.as_deref(), Some("Only a title"));
        assert!(!record.is_eligible());
    }

    #[test]
    fn test_page_content_blank_is_empty() {
        assert!(PageContent::new("  \n ").is_empty());
        assert!(!PageContent::new("Acme builds widgets.").is_empty());
    }
}
