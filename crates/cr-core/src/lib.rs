//! cr-core: Core types and traits for company-research
//!
//! This crate provides the foundational types and traits shared by the
//! research pipeline, its providers, and its content sources.

pub mod error;
pub mod message;
pub mod provider;
pub mod query;
pub mod source;
pub mod truncate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub use message::{Message, Role, Usage};
pub use provider::{
    CompletionConfig, CompletionRequest, CompletionResponse, FinishReason, Provider,
    ProviderFactory,
};
pub use query::{normalize_url, CompanyQuery};
pub use source::{ArticleRecord, NewsSearch, PageContent, PageFetcher, SearchOutcome};
pub use truncate::{truncate, truncate_with_marker, ELLIPSIS};

pub type Result<T> = std::result::Result<T, Error>;
