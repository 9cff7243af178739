//! Rendering of a finished research report.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use serde::Serialize;

use cr_pipeline::ResearchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Titled sections for reading in a terminal
    Text,
    /// The full report as a JSON document
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a ResearchReport,
}

pub fn render(report: &ResearchReport, format: OutputFormat, now: DateTime<Utc>) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => render_json(report, now),
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    out.push_str(&format!("=== {} ===\n", title));
    out.push_str(body.trim_end());
    out.push_str("\n\n");
}

fn render_text(report: &ResearchReport) -> String {
    let mut out = format!("Company Research: {}\n", report.query.company_name());
    if let Some(url) = report.query.company_url() {
        out.push_str(&format!("Website: {}\n", url));
    }
    out.push('\n');

    section(&mut out, "Company Overview", report.profile.text());

    let mut news = report.news.result.text().to_string();
    if report.news.skipped > 0 {
        news.push_str(&format!(
            "\n\n(Note: {} search result(s) were skipped: missing content or empty summary.)",
            report.news.skipped
        ));
    }
    section(&mut out, "Recent News Highlights", &news);

    section(&mut out, "Full Compiled Report", report.report.text());
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn render_json(report: &ResearchReport, now: DateTime<Utc>) -> Result<String> {
    let doc = JsonReport {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        report,
    };
    serde_json::to_string_pretty(&doc).context("Failed to serialize report")
}
