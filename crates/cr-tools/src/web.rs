//! Web page fetching and text extraction.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use cr_core::{Error, PageContent, PageFetcher};

const USER_AGENT: &str = concat!("company-research/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct WebFetchConfig {
    pub timeout: Duration,
    /// Swallow HTTP and network failures, reporting an empty page instead.
    pub continue_on_failure: bool,
}

impl Default for WebFetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            continue_on_failure: true,
        }
    }
}

/// Fetches a page over HTTP and extracts its readable text.
pub struct WebPageFetcher {
    client: Client,
    config: WebFetchConfig,
}

impl Default for WebPageFetcher {
    fn default() -> Self {
        Self::new(WebFetchConfig::default())
    }
}

impl WebPageFetcher {
    pub fn new(config: WebFetchConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, format!("Failed to fetch: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::fetch(url, format!("HTTP error {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| Error::fetch(url, format!("Failed to read response: {}", e)))
    }
}

#[async_trait]
impl PageFetcher for WebPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, Error> {
        let html = match self.fetch_html(url).await {
            Ok(html) => html,
            Err(e) if self.config.continue_on_failure => {
                warn!(url, error = %e, "Page fetch failed, continuing with empty content");
                return Ok(PageContent::empty());
            }
            Err(e) => return Err(e),
        };

        let text = extract_page_text(&html);
        debug!(url, chars = text.chars().count(), "Fetched page");
        Ok(PageContent::new(text))
    }
}

/// Extract readable text from an HTML document, preferring main content
/// regions and falling back to the body.
pub fn extract_page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let main_selector = Selector::parse("main, article, .content, #content, .post, .entry").ok();
    let body_selector = Selector::parse("body").ok();

    let text = if let Some(selector) = main_selector {
        let main_content: Vec<_> = document.select(&selector).collect();
        if !main_content.is_empty() {
            main_content
                .into_iter()
                .map(|el| extract_text(&el))
                .collect::<Vec<_>>()
                .join("\n\n")
        } else if let Some(body_sel) = body_selector {
            document
                .select(&body_sel)
                .map(|el| extract_text(&el))
                .collect::<Vec<_>>()
                .join("\n\n")
        } else {
            extract_text(&document.root_element())
        }
    } else {
        extract_text(&document.root_element())
    };

    clean_text(&text)
}

/// Extract text from an HTML element, filtering out scripts, styles and page chrome
fn extract_text(element: &scraper::ElementRef) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        // Only chrome inside the selected element counts
        let skipped = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != element.id())
            .any(|ancestor| {
                ancestor.value().as_element().is_some_and(|el| {
                    matches!(
                        el.name(),
                        "script" | "style" | "nav" | "footer" | "header" | "aside" | "noscript"
                    )
                })
            });
        if skipped {
            continue;
        }

        if let Some(t) = node.value().as_text() {
            let trimmed = t.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() && !text.ends_with(' ') && !text.ends_with('\n') {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }
    }

    text
}

/// Collapse runs of whitespace, keeping at most two consecutive newlines
fn clean_text(text: &str) -> String {
    let mut result = String::new();
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}
