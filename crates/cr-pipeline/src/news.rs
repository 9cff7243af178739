//! News stage: search recent coverage and summarize each hit.

use std::sync::Arc;

use tracing::{debug, info, warn};

use cr_core::{truncate_with_marker, ArticleRecord, Error, NewsSearch, SearchOutcome, ELLIPSIS};

use crate::llm::CompletionClient;
use crate::prompts::NEWS_SUMMARY_PROMPT;
use crate::result::{DegradedKind, NewsDigest, StageResult};

pub const NO_NEWS_FOUND: &str = "No recent news highlights found for this company.";
pub const NO_RELEVANT_SUMMARIES: &str =
    "No relevant news summaries could be generated from the found articles.";

pub struct NewsStage {
    client: CompletionClient,
    search: Arc<dyn NewsSearch>,
    article_chars: usize,
    max_results: usize,
}

impl NewsStage {
    pub fn new(
        client: CompletionClient,
        search: Arc<dyn NewsSearch>,
        article_chars: usize,
        max_results: usize,
    ) -> Self {
        Self {
            client,
            search,
            article_chars,
            max_results,
        }
    }

    /// Build a bulleted digest of recent news about `company_name`. Never
    /// fails; errors become a diagnostic naming the company.
    pub async fn run(&self, company_name: &str) -> NewsDigest {
        match self.digest(company_name).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(company = company_name, error = %e, "News stage failed");
                let kind = match e {
                    Error::Search(_) => DegradedKind::SearchFailed,
                    _ => DegradedKind::CompletionFailed,
                };
                NewsDigest::new(StageResult::degraded(
                    kind,
                    format!(
                        "Failed to generate news highlights for {} due to an error: {}",
                        company_name, e
                    ),
                ))
            }
        }
    }

    async fn digest(&self, company_name: &str) -> Result<NewsDigest, Error> {
        let outcome = self
            .search
            .search(company_name, self.max_results)
            .await
            .map_err(|e| match e {
                Error::Search(_) => e,
                other => Error::search(other.to_string()),
            })?;

        let articles = match outcome {
            SearchOutcome::Articles(articles) => articles,
            SearchOutcome::Failed(message) => {
                warn!(company = company_name, error = %message, "News search reported an error");
                return Ok(NewsDigest::new(StageResult::degraded(
                    DegradedKind::SearchFailed,
                    format!(
                        "Could not retrieve news for {} from the news search: {}",
                        company_name, message
                    ),
                )));
            }
        };

        if articles.is_empty() {
            info!(company = company_name, "News search returned no results");
            return Ok(NewsDigest::new(StageResult::degraded(
                DegradedKind::NoResults,
                NO_NEWS_FOUND,
            )));
        }

        let mut entries = Vec::with_capacity(articles.len());
        let mut skipped = 0;

        for article in &articles {
            match self.summarize(company_name, article).await? {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            info!(company = company_name, skipped, "Skipped news results (missing content or empty summary)");
        }

        let result = if entries.is_empty() {
            StageResult::degraded(DegradedKind::NoRelevantArticles, NO_RELEVANT_SUMMARIES)
        } else {
            info!(company = company_name, articles = entries.len(), "News highlights generated");
            StageResult::ready(entries.join("\n"))
        };

        Ok(NewsDigest {
            result,
            summarized: entries.len(),
            skipped,
        })
    }

    /// One `- summary (Source: url)` line, or `None` when the hit is
    /// ineligible or the summary came back blank.
    async fn summarize(
        &self,
        company_name: &str,
        article: &ArticleRecord,
    ) -> Result<Option<String>, Error> {
        if !article.is_eligible() {
            debug!(url = %article.url, "Skipping news result missing url or content");
            return Ok(None);
        }

        let content = truncate_with_marker(&article.content, self.article_chars, ELLIPSIS);
        let summary = self
            .client
            .complete(
                &NEWS_SUMMARY_PROMPT,
                &[("company_name", company_name), ("article_content", &content)],
            )
            .await?;

        let summary = summary.trim();
        if summary.is_empty() {
            debug!(url = %article.url, "Dropping blank news summary");
            return Ok(None);
        }

        Ok(Some(format!("- {} (Source: {})", summary, article.url)))
    }
}
