//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::provider::{
    CompletionConfig, CompletionRequest, CompletionResponse, Provider, ProviderFactory,
};
use crate::source::{NewsSearch, PageContent, PageFetcher, SearchOutcome};

/// A mock provider that returns pre-configured responses.
///
/// Queued responses are returned in FIFO order. When the queue is empty and
/// echo mode is on, the last user message is returned verbatim.
pub struct MockProvider {
    responses: Mutex<Vec<Result<CompletionResponse, Error>>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
    echo: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
            echo: false,
        }
    }

    /// A provider that answers every request with its own prompt.
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new()
        }
    }

    /// Queue a text response to be returned by the next complete() call.
    pub fn queue_response(&self, content: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(0, Ok(CompletionResponse::text(content)));
    }

    /// Queue a raw CompletionResponse.
    pub fn queue_raw_response(&self, response: CompletionResponse) {
        self.responses.lock().unwrap().insert(0, Ok(response));
    }

    /// Queue a failure for the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }

    /// Get the user prompt of the last captured request.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request()
            .and_then(|r| r.messages.last().map(|m| m.content.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.captured_requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop() {
            Some(response) => response,
            None if self.echo => Ok(CompletionResponse::text(prompt)),
            None => Err(Error::Unknown("No mock response queued".to_string())),
        }
    }
}

/// A factory handing out one shared provider and counting builds.
pub struct MockProviderFactory {
    provider: Arc<MockProvider>,
    builds: AtomicUsize,
}

impl MockProviderFactory {
    pub fn new(provider: Arc<MockProvider>) -> Self {
        Self {
            provider,
            builds: AtomicUsize::new(0),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ProviderFactory for MockProviderFactory {
    fn build(&self, _config: &CompletionConfig) -> Result<Arc<dyn Provider>, Error> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.provider.clone())
    }
}

/// A page fetcher serving fixed content per URL. Unknown URLs yield empty
/// content, mirroring a tolerant fetcher.
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, Result<String, String>>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, content: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(content.to_string()));
        self
    }

    pub fn with_failure(self, url: &str, message: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.lock().unwrap().get(url) {
            Some(Ok(content)) => Ok(PageContent::new(content.clone())),
            Some(Err(message)) => Err(Error::fetch(url, message.clone())),
            None => Ok(PageContent::empty()),
        }
    }
}

/// A news search returning one fixed outcome and recording queries.
pub struct MockNewsSearch {
    outcome: Mutex<Result<SearchOutcome, String>>,
    pub queries: Mutex<Vec<(String, usize)>>,
}

impl MockNewsSearch {
    pub fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome: Mutex::new(Ok(outcome)),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A search whose transport fails outright.
    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Mutex::new(Err(message.to_string())),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl NewsSearch for MockNewsSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome, Error> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        match &*self.outcome.lock().unwrap() {
            Ok(SearchOutcome::Articles(articles)) => Ok(SearchOutcome::Articles(
                articles.iter().take(max_results).cloned().collect(),
            )),
            Ok(outcome) => Ok(outcome.clone()),
            Err(message) => Err(Error::search(message.clone())),
        }
    }
}
