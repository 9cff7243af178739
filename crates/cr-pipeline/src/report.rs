//! Report stage: merge the profile and news results into one report.

use tracing::{info, warn};

use crate::llm::CompletionClient;
use crate::prompts::FINAL_REPORT_PROMPT;
use crate::result::{DegradedKind, StageResult};

pub const NO_PROFILE_SUMMARY: &str = "No profile summary available.";
pub const NO_NEWS_SUMMARIES: &str = "No news summaries available.";

pub struct ReportStage {
    client: CompletionClient,
}

impl ReportStage {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Compile the final report. Upstream diagnostics are passed through as
    /// ordinary text.
    pub async fn run(
        &self,
        company_name: &str,
        profile: &StageResult,
        news: &StageResult,
    ) -> StageResult {
        let profile_summary = non_empty_or(profile.text(), NO_PROFILE_SUMMARY);
        let news_summaries = non_empty_or(news.text(), NO_NEWS_SUMMARIES);

        if let Some(kind) = profile.degraded_kind() {
            info!(company = company_name, ?kind, "Profile input is a diagnostic");
        }
        if let Some(kind) = news.degraded_kind() {
            info!(company = company_name, ?kind, "News input is a diagnostic");
        }

        let result = self
            .client
            .complete(
                &FINAL_REPORT_PROMPT,
                &[
                    ("company_name", company_name),
                    ("profile_summary", profile_summary),
                    ("news_summaries", news_summaries),
                ],
            )
            .await;

        match result {
            Ok(report) => {
                info!(company = company_name, chars = report.len(), "Final report generated");
                StageResult::ready(report)
            }
            Err(e) => {
                warn!(company = company_name, error = %e, "Report stage failed");
                StageResult::degraded(
                    DegradedKind::CompletionFailed,
                    format!(
                        "Failed to generate final report for {} due to an error.",
                        company_name
                    ),
                )
            }
        }
    }
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::testing::MockProvider;
    use cr_core::{CompletionConfig, Error};
    use std::sync::Arc;

    fn stage(provider: Arc<MockProvider>) -> ReportStage {
        ReportStage::new(CompletionClient::new(
            provider,
            CompletionConfig::new("m", 0.2, 1024).with_api_key("k"),
        ))
    }

    #[tokio::test]
    async fn test_inputs_reach_prompt() {
        let provider = Arc::new(MockProvider::echo());
        let profile = StageResult::ready("Acme makes widgets.");
        let news = StageResult::degraded(DegradedKind::NoResults, "No recent news highlights found for this company.");

        let report = stage(provider).run("Acme", &profile, &news).await;

        assert!(report.is_ready());
        assert!(report.text().contains("Acme makes widgets."));
        assert!(report.text().contains("No recent news highlights found for this company."));
    }

    #[tokio::test]
    async fn test_empty_inputs_replaced() {
        let provider = Arc::new(MockProvider::echo());
        let report = stage(provider)
            .run("Acme", &StageResult::ready(""), &StageResult::ready("  "))
            .await;

        assert!(report.text().contains(NO_PROFILE_SUMMARY));
        assert!(report.text().contains(NO_NEWS_SUMMARIES));
    }

    #[tokio::test]
    async fn test_completion_error_becomes_diagnostic() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(Error::api(500, "internal"));

        let report = stage(provider)
            .run("Acme", &StageResult::ready("p"), &StageResult::ready("n"))
            .await;

        assert_eq!(
            report,
            StageResult::degraded(
                DegradedKind::CompletionFailed,
                "Failed to generate final report for Acme due to an error."
            )
        );
    }
}
