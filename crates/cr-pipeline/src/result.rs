use serde::Serialize;

/// Why a stage produced a diagnostic instead of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedKind {
    /// The stage was not run (no company URL supplied).
    Skipped,
    /// The page was fetched but had no extractable text.
    EmptyContent,
    FetchFailed,
    SearchFailed,
    /// The search succeeded with zero hits.
    NoResults,
    /// Hits were found but none produced a usable summary.
    NoRelevantArticles,
    CompletionFailed,
}

/// Output of one stage: a summary, or a self-describing diagnostic.
///
/// Both variants carry displayable text so downstream stages always have
/// something to consume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    Ready { text: String },
    Degraded { kind: DegradedKind, detail: String },
}

impl StageResult {
    pub fn ready(text: impl Into<String>) -> Self {
        StageResult::Ready { text: text.into() }
    }

    pub fn degraded(kind: DegradedKind, detail: impl Into<String>) -> Self {
        StageResult::Degraded {
            kind,
            detail: detail.into(),
        }
    }

    /// The summary, or the diagnostic sentence.
    pub fn text(&self) -> &str {
        match self {
            StageResult::Ready { text } => text,
            StageResult::Degraded { detail, .. } => detail,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StageResult::Ready { .. })
    }

    pub fn degraded_kind(&self) -> Option<DegradedKind> {
        match self {
            StageResult::Ready { .. } => None,
            StageResult::Degraded { kind, .. } => Some(*kind),
        }
    }
}

impl std::fmt::Display for StageResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// News stage output along with how many hits were used and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsDigest {
    pub result: StageResult,
    pub summarized: usize,
    pub skipped: usize,
}

impl NewsDigest {
    pub fn new(result: StageResult) -> Self {
        Self {
            result,
            summarized: 0,
            skipped: 0,
        }
    }
}
