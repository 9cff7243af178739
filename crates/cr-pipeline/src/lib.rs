//! Research pipeline for company-research.
//!
//! This crate provides:
//! - The three stages (`ProfileStage`, `NewsStage`, `ReportStage`), each of
//!   which turns failures into a diagnostic `StageResult`
//! - `ResearchPipeline`, which sequences the stages and memoizes them
//! - `ClientRegistry`, which caches completion clients per configuration

mod config;
mod llm;
mod memo;
mod news;
mod pipeline;
mod profile;
mod prompts;
mod report;
mod result;

pub use config::{
    Limits, ResearchConfig, DEFAULT_ARTICLE_CHARS, DEFAULT_NEWS_RESULTS, DEFAULT_WEBSITE_CHARS,
};
pub use llm::{ClientRegistry, CompletionClient};
pub use memo::MemoCache;
pub use news::{NewsStage, NO_NEWS_FOUND, NO_RELEVANT_SUMMARIES};
pub use pipeline::{Phase, ProgressFn, ResearchPipeline, ResearchReport};
pub use profile::{ProfileStage, NO_URL_PLACEHOLDER};
pub use prompts::{PromptTemplate, COMPANY_PROFILE_PROMPT, FINAL_REPORT_PROMPT, NEWS_SUMMARY_PROMPT};
pub use report::{ReportStage, NO_NEWS_SUMMARIES, NO_PROFILE_SUMMARY};
pub use result::{DegradedKind, NewsDigest, StageResult};
