use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {url} - {message}")]
    Fetch { url: String, message: String },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Template error: {template} - {message}")]
    Template { template: String, message: String },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into())
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Configuration errors are fatal and must stop a request before any stage runs.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::api(400, "Bad request");
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Bad request"));
    }

    #[test]
    fn test_fetch_error_names_url() {
        let err = Error::fetch("https://acme.test", "connection refused");
        let text = err.to_string();
        assert!(text.contains("https://acme.test"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::config("TOGETHER_API_KEY not set").is_config_error());
        assert!(!Error::completion("boom").is_config_error());
    }
}
