use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cr_core::CompletionConfig;
use cr_pipeline::{Limits, ResearchConfig};
use cr_providers::ProviderKind;
use cr_tools::WebFetchConfig;

/// Prefix for environment overrides, e.g. `COMPANY_RESEARCH_LIMITS__NEWS_RESULTS=5`
pub const ENV_PREFIX: &str = "COMPANY_RESEARCH_";

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const SEARCH_API_KEY_VAR: &str = "TAVILY_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion service (together, openai)
    #[serde(default)]
    pub provider: ProviderKind,

    /// Override the service's default endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Run the profile and news stages concurrently
    #[serde(default)]
    pub parallel: bool,

    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub fetch: FetchConfigEntry,

    #[serde(default)]
    pub search: SearchConfigEntry,

    /// Completion API key; falls back to `<PROVIDER>_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// News search API key; falls back to `TAVILY_API_KEY`
    #[serde(default, skip_serializing)]
    pub search_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfigEntry {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Treat unreachable pages as empty instead of failing the profile
    #[serde(default = "default_true")]
    pub continue_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfigEntry {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for FetchConfigEntry {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            continue_on_failure: true,
        }
    }
}

impl Default for SearchConfigEntry {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_model(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            parallel: false,
            limits: Limits::default(),
            fetch: FetchConfigEntry::default(),
            search: SearchConfigEntry::default(),
            api_key: None,
            search_api_key: None,
        }
    }
}

/// Settings given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
}

impl Config {
    /// Resolve defaults, then the config file, then `COMPANY_RESEARCH_*`
    /// environment variables, then command-line overrides.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::config_path().filter(|path| path.exists()),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "Loading config file");
            figment = figment.merge(Toml::file(file));
        }
        figment = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(overrides));

        let config: Config = figment
            .extract()
            .context("Failed to load configuration")?;
        Ok(config)
    }

    /// `<config_dir>/company-research/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("company-research").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            anyhow::bail!("model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "temperature must be between 0.0 and 2.0 (got {})",
                self.temperature
            );
        }
        if self.max_tokens == 0 {
            anyhow::bail!("max_tokens must be at least 1");
        }
        self.research_config().validate()?;
        Ok(())
    }

    /// Completion API key from the file, else the provider's environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        let var = self.provider.api_key_var();
        non_blank(self.api_key.clone())
            .or_else(|| non_blank(std::env::var(&var).ok()))
            .with_context(|| {
                format!(
                    "API key not found for provider '{}'. Set {} or api_key in the config file",
                    self.provider.as_str(),
                    var
                )
            })
    }

    pub fn resolve_search_api_key(&self) -> Result<String> {
        non_blank(self.search_api_key.clone())
            .or_else(|| non_blank(std::env::var(SEARCH_API_KEY_VAR).ok()))
            .with_context(|| {
                format!(
                    "News search API key not found. Set {} or search_api_key in the config file",
                    SEARCH_API_KEY_VAR
                )
            })
    }

    pub fn completion_config(&self) -> Result<CompletionConfig> {
        Ok(
            CompletionConfig::new(self.model.clone(), self.temperature as f32, self.max_tokens)
                .with_api_key(self.resolve_api_key()?),
        )
    }

    pub fn research_config(&self) -> ResearchConfig {
        ResearchConfig {
            limits: self.limits,
            parallel: self.parallel,
        }
    }

    pub fn fetch_config(&self) -> WebFetchConfig {
        WebFetchConfig {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            continue_on_failure: self.fetch.continue_on_failure,
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search.timeout_secs)
    }

    /// Effective settings as TOML. Credentials are never included.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider, ProviderKind::Together);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.limits.website_chars, 8000);
        assert!(config.fetch.continue_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_file_with_partial_tables() {
        let file = write_config(
            r#"
            provider = "openai"
            model = "gpt-4o-mini"
            temperature = 0.5

            [limits]
            news_results = 5

            [fetch]
            continue_on_failure = false
            "#,
        );

        let config = Config::load(Some(file.path()), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAI);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.limits.news_results, 5);
        assert_eq!(config.limits.article_chars, 4000);
        assert!(!config.fetch.continue_on_failure);
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config("model = \"from-file\"\nmax_tokens = 256\n");
        let overrides = ConfigOverrides {
            model: Some("from-cli".to_string()),
            parallel: Some(true),
            ..Default::default()
        };

        let config = Config::load(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.model, "from-cli");
        assert_eq!(config.max_tokens, 256);
        assert!(config.parallel);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(
            Some(Path::new("/nonexistent/company-research.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let file = write_config("temperature = \"warm\"\n");
        assert!(Config::load(Some(file.path()), &ConfigOverrides::default()).is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.limits.website_chars = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_from_file() {
        let config = Config {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        let completion = config.completion_config().unwrap();
        assert!(completion.has_credential());
        assert_eq!(completion.model_id, DEFAULT_MODEL);
        assert_eq!(completion.max_output_tokens, 1024);
    }

    #[test]
    fn test_printed_config_omits_keys() {
        let config = Config {
            api_key: Some("secret-key".to_string()),
            search_api_key: Some("secret-search".to_string()),
            ..Default::default()
        };
        let printed = config.to_toml().unwrap();
        assert!(printed.contains("provider = \"together\""));
        assert!(printed.contains("[limits]"));
        assert!(!printed.contains("secret"));
    }
}
