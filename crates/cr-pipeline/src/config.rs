//! Pipeline settings: content limits and scheduling.

use serde::{Deserialize, Serialize};

use cr_core::Error;

pub const DEFAULT_WEBSITE_CHARS: usize = 8000;
pub const DEFAULT_ARTICLE_CHARS: usize = 4000;
pub const DEFAULT_NEWS_RESULTS: usize = 3;

/// Character limits applied to external text before it reaches the model,
/// and the news search bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Max characters of page text fed to the profile prompt
    #[serde(default = "default_website_chars")]
    pub website_chars: usize,

    /// Max characters of each news article fed to the summary prompt
    #[serde(default = "default_article_chars")]
    pub article_chars: usize,

    /// Max news search hits to summarize
    #[serde(default = "default_news_results")]
    pub news_results: usize,
}

fn default_website_chars() -> usize {
    DEFAULT_WEBSITE_CHARS
}

fn default_article_chars() -> usize {
    DEFAULT_ARTICLE_CHARS
}

fn default_news_results() -> usize {
    DEFAULT_NEWS_RESULTS
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            website_chars: DEFAULT_WEBSITE_CHARS,
            article_chars: DEFAULT_ARTICLE_CHARS,
            news_results: DEFAULT_NEWS_RESULTS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub limits: Limits,

    /// Run the profile and news stages concurrently
    #[serde(default)]
    pub parallel: bool,
}

impl ResearchConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.limits.website_chars == 0 {
            return Err(Error::config("limits.website_chars must be at least 1"));
        }
        if self.limits.article_chars == 0 {
            return Err(Error::config("limits.article_chars must be at least 1"));
        }
        if self.limits.news_results == 0 {
            return Err(Error::config("limits.news_results must be at least 1"));
        }
        Ok(())
    }
}
