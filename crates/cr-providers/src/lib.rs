//! cr-providers: completion provider implementations for company-research
//!
//! This crate provides an OpenAI-compatible implementation of the Provider
//! trait and a factory that points it at a hosted service.

pub mod factory;
pub mod openai;

pub use factory::{HostedProviderFactory, ProviderKind, TOGETHER_BASE_URL};
pub use openai::{OpenAIProvider, OPENAI_BASE_URL};
