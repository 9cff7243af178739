//! cr-tools: content sources for company-research
//!
//! This crate provides the concrete collaborators the pipeline reads from:
//! - Web: fetch a page and extract its readable text
//! - Tavily: search recent news articles

pub mod tavily;
pub mod web;

pub use tavily::{TavilyNewsSearch, TAVILY_BASE_URL};
pub use web::{extract_page_text, WebFetchConfig, WebPageFetcher};
