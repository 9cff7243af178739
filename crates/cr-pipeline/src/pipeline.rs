//! Orchestration of the three research stages.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use cr_core::{CompanyQuery, NewsSearch, PageFetcher};

use crate::config::ResearchConfig;
use crate::llm::CompletionClient;
use crate::memo::MemoCache;
use crate::news::NewsStage;
use crate::profile::ProfileStage;
use crate::report::ReportStage;
use crate::result::{NewsDigest, StageResult};

/// Where a research request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    ProfileRunning,
    ProfileDone,
    NewsRunning,
    NewsDone,
    ReportRunning,
    ReportDone,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "Starting research",
            Phase::ProfileRunning => "Generating company profile",
            Phase::ProfileDone => "Company profile ready",
            Phase::NewsRunning => "Searching and summarizing news",
            Phase::NewsDone => "News highlights ready",
            Phase::ReportRunning => "Compiling final report",
            Phase::ReportDone => "Report complete",
        };
        f.write_str(label)
    }
}

/// Observer notified on every phase transition.
pub type ProgressFn = Arc<dyn Fn(Phase) + Send + Sync>;

/// All three outputs of one research request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResearchReport {
    pub query: CompanyQuery,
    pub profile: StageResult,
    pub news: NewsDigest,
    pub report: StageResult,
}

/// Memo key for the report stage. Two requests share a report only when the
/// company and both upstream results match exactly.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ReportKey {
    company_name: String,
    profile: StageResult,
    news: StageResult,
}

impl fmt::Debug for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportKey")
            .field("company_name", &self.company_name)
            .finish_non_exhaustive()
    }
}

pub struct ResearchPipeline {
    profile: ProfileStage,
    news: NewsStage,
    report: ReportStage,
    parallel: bool,
    profile_cache: MemoCache<String, StageResult>,
    news_cache: MemoCache<String, NewsDigest>,
    report_cache: MemoCache<ReportKey, StageResult>,
    progress: Option<ProgressFn>,
}

impl ResearchPipeline {
    pub fn new(
        client: CompletionClient,
        fetcher: Arc<dyn PageFetcher>,
        search: Arc<dyn NewsSearch>,
        config: &ResearchConfig,
    ) -> Self {
        let limits = config.limits;
        Self {
            profile: ProfileStage::new(client.clone(), fetcher, limits.website_chars),
            news: NewsStage::new(
                client.clone(),
                search,
                limits.article_chars,
                limits.news_results,
            ),
            report: ReportStage::new(client),
            parallel: config.parallel,
            profile_cache: MemoCache::new("company_profile"),
            news_cache: MemoCache::new("news_summaries"),
            report_cache: MemoCache::new("final_report"),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn emit(&self, phase: Phase) {
        debug!(%phase, "Phase transition");
        if let Some(progress) = &self.progress {
            progress(phase);
        }
    }

    /// Memoized profile stage, keyed by URL.
    pub async fn profile_summary(&self, company_url: &str) -> StageResult {
        self.profile_cache
            .get_or_compute(company_url.to_string(), || self.profile.run(company_url))
            .await
    }

    /// Memoized news stage, keyed by company name.
    pub async fn news_digest(&self, company_name: &str) -> NewsDigest {
        self.news_cache
            .get_or_compute(company_name.to_string(), || self.news.run(company_name))
            .await
    }

    /// Memoized report stage, keyed by company name and both inputs.
    pub async fn final_report(
        &self,
        company_name: &str,
        profile: &StageResult,
        news: &StageResult,
    ) -> StageResult {
        let key = ReportKey {
            company_name: company_name.to_string(),
            profile: profile.clone(),
            news: news.clone(),
        };
        self.report_cache
            .get_or_compute(key, || self.report.run(company_name, profile, news))
            .await
    }

    async fn profile_phase(&self, query: &CompanyQuery) -> StageResult {
        match query.company_url() {
            Some(url) => {
                self.emit(Phase::ProfileRunning);
                let profile = self.profile_summary(url).await;
                self.emit(Phase::ProfileDone);
                profile
            }
            None => {
                info!(company = query.company_name(), "No company URL, skipping profile");
                self.emit(Phase::ProfileDone);
                ProfileStage::skipped()
            }
        }
    }

    async fn news_phase(&self, query: &CompanyQuery) -> NewsDigest {
        self.emit(Phase::NewsRunning);
        let news = self.news_digest(query.company_name()).await;
        self.emit(Phase::NewsDone);
        news
    }

    /// Run every stage for `query`. Always produces a report; stage failures
    /// show up as diagnostics inside it.
    pub async fn run(&self, query: &CompanyQuery) -> ResearchReport {
        let company_name = query.company_name();
        info!(
            company = company_name,
            url = query.company_url().unwrap_or(""),
            parallel = self.parallel,
            "Starting company research"
        );
        self.emit(Phase::Idle);

        let (profile, news) = if self.parallel {
            futures::join!(self.profile_phase(query), self.news_phase(query))
        } else {
            let profile = self.profile_phase(query).await;
            let news = self.news_phase(query).await;
            (profile, news)
        };

        self.emit(Phase::ReportRunning);
        let report = self.final_report(company_name, &profile, &news.result).await;
        self.emit(Phase::ReportDone);

        info!(
            company = company_name,
            profile_ready = profile.is_ready(),
            news_ready = news.result.is_ready(),
            report_ready = report.is_ready(),
            "Company research finished"
        );

        ResearchReport {
            query: query.clone(),
            profile,
            news,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cr_core::testing::{MockFetcher, MockNewsSearch, MockProvider};
    use cr_core::{CompletionConfig, SearchOutcome};
    use std::sync::Mutex;

    fn pipeline(provider: Arc<MockProvider>) -> ResearchPipeline {
        let client =
            CompletionClient::new(provider, CompletionConfig::new("m", 0.2, 1024).with_api_key("k"));
        ResearchPipeline::new(
            client,
            Arc::new(MockFetcher::new().with_page("https://acme.test", "Acme builds widgets.")),
            Arc::new(MockNewsSearch::new(SearchOutcome::Articles(vec![]))),
            &ResearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_phase_sequence_with_url() {
        let phases = Arc::new(Mutex::new(Vec::new()));
        let recorded = phases.clone();
        let pipeline = pipeline(Arc::new(MockProvider::echo()))
            .with_progress(Arc::new(move |phase| recorded.lock().unwrap().push(phase)));

        let query = CompanyQuery::new("Acme", Some("https://acme.test")).unwrap();
        pipeline.run(&query).await;

        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                Phase::Idle,
                Phase::ProfileRunning,
                Phase::ProfileDone,
                Phase::NewsRunning,
                Phase::NewsDone,
                Phase::ReportRunning,
                Phase::ReportDone,
            ]
        );
    }

    #[tokio::test]
    async fn test_phase_sequence_without_url() {
        let phases = Arc::new(Mutex::new(Vec::new()));
        let recorded = phases.clone();
        let pipeline = pipeline(Arc::new(MockProvider::echo()))
            .with_progress(Arc::new(move |phase| recorded.lock().unwrap().push(phase)));

        let query = CompanyQuery::new("Acme", None).unwrap();
        let report = pipeline.run(&query).await;

        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                Phase::Idle,
                Phase::ProfileDone,
                Phase::NewsRunning,
                Phase::NewsDone,
                Phase::ReportRunning,
                Phase::ReportDone,
            ]
        );
        assert_eq!(report.profile, ProfileStage::skipped());
    }

    #[tokio::test]
    async fn test_report_memoized_on_identical_inputs() {
        let provider = Arc::new(MockProvider::echo());
        let pipeline = pipeline(provider.clone());
        let profile = StageResult::ready("p");
        let news = StageResult::ready("n");

        pipeline.final_report("Acme", &profile, &news).await;
        pipeline.final_report("Acme", &profile, &news).await;
        assert_eq!(provider.request_count(), 1);

        pipeline
            .final_report("Acme", &profile, &StageResult::ready("other"))
            .await;
        assert_eq!(provider.request_count(), 2);
    }

    #[test]
    fn test_report_key_debug_hides_inputs() {
        let key = ReportKey {
            company_name: "Acme".to_string(),
            profile: StageResult::ready("long profile text"),
            news: StageResult::ready("long news text"),
        };
        let debug = format!("{:?}", key);
        assert!(debug.contains("Acme"));
        assert!(!debug.contains("long profile text"));
    }
}
