use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cr_core::{CompletionConfig, Error, Provider, ProviderFactory};

use crate::openai::{OpenAIProvider, OPENAI_BASE_URL};

pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

/// Hosted completion services reachable through the OpenAI-compatible client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Together,
    #[serde(alias = "openai-compatible")]
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Together => "together",
            ProviderKind::OpenAI => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Together => TOGETHER_BASE_URL,
            ProviderKind::OpenAI => OPENAI_BASE_URL,
        }
    }

    /// Environment variable holding this service's credential.
    pub fn api_key_var(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "together" | "togetherai" => Ok(ProviderKind::Together),
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAI),
            other => Err(Error::config(format!("Unknown provider '{}'", other))),
        }
    }
}

/// Builds [`OpenAIProvider`] clients pointed at the configured service.
#[derive(Debug, Clone)]
pub struct HostedProviderFactory {
    kind: ProviderKind,
    base_url: String,
}

impl HostedProviderFactory {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ProviderFactory for HostedProviderFactory {
    fn build(&self, config: &CompletionConfig) -> Result<Arc<dyn Provider>, Error> {
        if !config.has_credential() {
            return Err(Error::config(format!(
                "{} not found in environment variables. Please set it in your .env file.",
                self.kind.api_key_var()
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::config("Provider base URL cannot be empty"));
        }

        debug!(
            provider = self.kind.as_str(),
            base_url = %self.base_url,
            model = %config.model_id,
            "Building completion client"
        );

        let provider = OpenAIProvider::new(config.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_default_model(config.model_id.clone());
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("together".parse::<ProviderKind>().unwrap(), ProviderKind::Together);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert!("gemini".parse::<ProviderKind>().unwrap_err().is_config_error());
    }

    #[test]
    fn test_api_key_var() {
        assert_eq!(ProviderKind::Together.api_key_var(), "TOGETHER_API_KEY");
        assert_eq!(ProviderKind::OpenAI.api_key_var(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_build_requires_credential() {
        let factory = HostedProviderFactory::new(ProviderKind::Together);
        let config = CompletionConfig::new("mistralai/Mistral-7B-Instruct-v0.3", 0.2, 1024);
        let err = factory.build(&config).err().unwrap();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("TOGETHER_API_KEY"));
    }

    #[test]
    fn test_build_with_credential() {
        let factory = HostedProviderFactory::new(ProviderKind::Together);
        let config = CompletionConfig::new("mistralai/Mistral-7B-Instruct-v0.3", 0.2, 1024)
            .with_api_key("test-key");
        let provider = factory.build(&config).unwrap();
        assert_eq!(
            provider.default_model(),
            Some("mistralai/Mistral-7B-Instruct-v0.3")
        );
    }

    #[test]
    fn test_custom_base_url() {
        let factory =
            HostedProviderFactory::new(ProviderKind::OpenAI).with_base_url("http://localhost:8080/v1");
        assert_eq!(factory.base_url(), "http://localhost:8080/v1");
        assert_eq!(factory.kind(), ProviderKind::OpenAI);
    }
}
