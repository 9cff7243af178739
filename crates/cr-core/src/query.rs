use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single research request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyQuery {
    company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_url: Option<String>,
}

impl CompanyQuery {
    /// Build a query. The name must be non-blank; a blank URL counts as absent
    /// and a present one is normalized to carry a scheme.
    pub fn new(company_name: impl Into<String>, company_url: Option<&str>) -> Result<Self, Error> {
        let company_name = company_name.into().trim().to_string();
        if company_name.is_empty() {
            return Err(Error::invalid_request("Company name is required"));
        }

        let company_url = company_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(normalize_url);

        Ok(Self {
            company_name,
            company_url,
        })
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn company_url(&self) -> Option<&str> {
        self.company_url.as_deref()
    }
}

/// Prepend `https://` when `url` has no http(s) scheme. Empty input stays empty.
pub fn normalize_url(url: &str) -> String {
    if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
        format!("https://{}", url)
    } else {
        url.to_string()
    }
}
