//! Completion client and the per-configuration client registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use cr_core::{CompletionConfig, CompletionRequest, Error, Message, Provider, ProviderFactory};

use crate::prompts::PromptTemplate;

/// Renders prompt templates and sends them to a provider built for one
/// fixed [`CompletionConfig`].
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    /// Render `template` with `variables` and return the generated text.
    ///
    /// Provider failures of every kind surface as [`Error::Completion`].
    /// Output without an extractable text field is returned in its raw
    /// string form.
    pub async fn complete(
        &self,
        template: &PromptTemplate,
        variables: &[(&str, &str)],
    ) -> Result<String, Error> {
        let prompt = template.render(variables)?;

        let request = CompletionRequest::new(vec![Message::user(prompt)])
            .with_model(self.config.model_id.clone())
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_output_tokens);

        debug!(
            template = template.name,
            provider = self.provider.name(),
            model = %self.config.model_id,
            "Requesting completion"
        );

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| Error::completion(e.to_string()))?;

        if response.content.is_none() {
            warn!(
                template = template.name,
                raw = %response.raw,
                "Completion output had no text field, using raw output"
            );
        }

        debug!(
            template = template.name,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Completion finished"
        );

        Ok(response.text_or_raw())
    }
}

/// Hands out completion clients, building at most one provider per distinct
/// configuration.
pub struct ClientRegistry {
    factory: Arc<dyn ProviderFactory>,
    clients: Mutex<HashMap<CompletionConfig, Arc<dyn Provider>>>,
}

impl ClientRegistry {
    pub fn new(factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Get a client for `config`, reusing a cached provider when every field
    /// of the config matches one already built.
    ///
    /// A missing credential or a failed build is a configuration error; a
    /// failed build leaves nothing cached.
    pub fn get_llm(&self, config: &CompletionConfig) -> Result<CompletionClient, Error> {
        if !config.has_credential() {
            return Err(Error::config(
                "API key for the completion provider is missing",
            ));
        }

        // Held across the build so concurrent callers never construct twice.
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(provider) = clients.get(config) {
            debug!(model = %config.model_id, "Reusing cached completion client");
            return Ok(CompletionClient::new(provider.clone(), config.clone()));
        }

        let provider = self.factory.build(config).map_err(|e| match e {
            Error::Config(_) => e,
            other => Error::config(format!("Failed to initialize the language model: {}", other)),
        })?;

        info!(
            model = %config.model_id,
            temperature = config.temperature,
            max_tokens = config.max_output_tokens,
            "Initialized completion client"
        );
        clients.insert(config.clone(), provider.clone());

        Ok(CompletionClient::new(provider, config.clone()))
    }

    /// Number of distinct configurations with a built client.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::NEWS_SUMMARY_PROMPT;
    use cr_core::testing::{MockProvider, MockProviderFactory};
    use cr_core::{CompletionResponse, FinishReason, Usage};

    fn config() -> CompletionConfig {
        CompletionConfig::new("mistralai/Mistral-7B-Instruct-v0.3", 0.2, 1024).with_api_key("key")
    }

    struct FailingFactory;

    impl ProviderFactory for FailingFactory {
        fn build(&self, _config: &CompletionConfig) -> Result<Arc<dyn Provider>, Error> {
            Err(Error::network("dns failure"))
        }
    }

    #[test]
    fn test_registry_reuses_client_for_same_config() {
        let factory = Arc::new(MockProviderFactory::new(Arc::new(MockProvider::new())));
        let registry = ClientRegistry::new(factory.clone());

        registry.get_llm(&config()).unwrap();
        registry.get_llm(&config()).unwrap();

        assert_eq!(factory.build_count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_rebuilds_on_config_change() {
        let factory = Arc::new(MockProviderFactory::new(Arc::new(MockProvider::new())));
        let registry = ClientRegistry::new(factory.clone());

        registry.get_llm(&config()).unwrap();
        let mut warmer = config();
        warmer.temperature = 0.9;
        registry.get_llm(&warmer).unwrap();
        registry.get_llm(&config().with_api_key("other-key")).unwrap();

        assert_eq!(factory.build_count(), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_missing_credential_is_config_error() {
        let factory = Arc::new(MockProviderFactory::new(Arc::new(MockProvider::new())));
        let registry = ClientRegistry::new(factory.clone());

        let err = registry
            .get_llm(&CompletionConfig::new("m", 0.2, 1024))
            .err()
            .unwrap();
        assert!(err.is_config_error());
        assert_eq!(factory.build_count(), 0);
    }

    #[test]
    fn test_registry_build_failure_not_cached() {
        let registry = ClientRegistry::new(Arc::new(FailingFactory));
        let err = registry.get_llm(&config()).err().unwrap();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("dns failure"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_complete_sends_config() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_response("Acme raised money.");
        let client = CompletionClient::new(provider.clone(), config());

        let text = client
            .complete(
                &NEWS_SUMMARY_PROMPT,
                &[("company_name", "Acme"), ("article_content", "Acme raised money today.")],
            )
            .await
            .unwrap();

        assert_eq!(text, "Acme raised money.");
        let request = provider.last_request().unwrap();
        assert_eq!(request.model.as_deref(), Some("mistralai/Mistral-7B-Instruct-v0.3"));
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(1024));
        assert!(provider.last_prompt().unwrap().contains("Acme raised money today."));
    }

    #[tokio::test]
    async fn test_complete_collapses_provider_errors() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_error(Error::rate_limit("slow down"));
        let client = CompletionClient::new(provider, config());

        let err = client
            .complete(
                &NEWS_SUMMARY_PROMPT,
                &[("company_name", "Acme"), ("article_content", "x")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Completion(ref m) if m.contains("slow down")));
    }

    #[tokio::test]
    async fn test_complete_falls_back_to_raw_output() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_raw_response(CompletionResponse {
            content: None,
            raw: serde_json::json!({"generated": "Acme news"}),
            usage: Usage::default(),
            model: "m".to_string(),
            finish_reason: FinishReason::Stop,
        });
        let client = CompletionClient::new(provider, config());

        let text = client
            .complete(
                &NEWS_SUMMARY_PROMPT,
                &[("company_name", "Acme"), ("article_content", "x")],
            )
            .await
            .unwrap();
        assert!(text.contains("Acme news"));
    }

    #[tokio::test]
    async fn test_complete_template_error_skips_provider() {
        let provider = Arc::new(MockProvider::new());
        let client = CompletionClient::new(provider.clone(), config());

        let err = client
            .complete(&NEWS_SUMMARY_PROMPT, &[("company_name", "Acme")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert_eq!(provider.request_count(), 0);
    }
}
