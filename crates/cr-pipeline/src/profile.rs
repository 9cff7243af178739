//! Company profile stage: summarize the company's own website.

use std::sync::Arc;

use tracing::{info, warn};

use cr_core::{truncate, Error, PageFetcher};

use crate::llm::CompletionClient;
use crate::prompts::COMPANY_PROFILE_PROMPT;
use crate::result::{DegradedKind, StageResult};

/// Stand-in profile when no company URL was supplied.
pub const NO_URL_PLACEHOLDER: &str =
    "Company profile requires a valid URL and could not be generated.";

pub struct ProfileStage {
    client: CompletionClient,
    fetcher: Arc<dyn PageFetcher>,
    website_chars: usize,
}

impl ProfileStage {
    pub fn new(client: CompletionClient, fetcher: Arc<dyn PageFetcher>, website_chars: usize) -> Self {
        Self {
            client,
            fetcher,
            website_chars,
        }
    }

    /// The result used in place of running the stage without a URL.
    pub fn skipped() -> StageResult {
        StageResult::degraded(DegradedKind::Skipped, NO_URL_PLACEHOLDER)
    }

    /// Summarize the page at `company_url`. Never fails; errors become a
    /// diagnostic naming the URL.
    pub async fn run(&self, company_url: &str) -> StageResult {
        match self.summarize(company_url).await {
            Ok(result) => result,
            Err(e) => {
                warn!(url = company_url, error = %e, "Company profile stage failed");
                let kind = match e {
                    Error::Fetch { .. } => DegradedKind::FetchFailed,
                    _ => DegradedKind::CompletionFailed,
                };
                StageResult::degraded(
                    kind,
                    format!(
                        "Failed to generate company profile for {} due to an error: {}",
                        company_url, e
                    ),
                )
            }
        }
    }

    async fn summarize(&self, company_url: &str) -> Result<StageResult, Error> {
        let page = self.fetcher.fetch(company_url).await?;

        if page.is_empty() {
            warn!(url = company_url, "No content retrieved for company profile");
            return Ok(StageResult::degraded(
                DegradedKind::EmptyContent,
                format!(
                    "No detailed company profile information could be retrieved from {}. \
                     The page might be empty, protected, or require JavaScript.",
                    company_url
                ),
            ));
        }

        let content = truncate(&page.content, self.website_chars);
        let summary = self
            .client
            .complete(
                &COMPANY_PROFILE_PROMPT,
                &[("company_url", company_url), ("website_content", &content)],
            )
            .await?;

        info!(url = company_url, chars = summary.len(), "Company profile generated");
        Ok(StageResult::ready(summary))
    }
}
