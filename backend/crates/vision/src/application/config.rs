//! Application Configuration
//!
//! Provider endpoints, keys and limits for the vision API.

use std::time::Duration;

use derive_more::Display;

/// Provider used when the form does not name one
pub const DEFAULT_PROVIDER: &str = "azure";

const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";
const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4o";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Wire dialect of an OpenAI-compatible endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProviderKind {
    /// Deployment in the URL, `api-key` header, `api-version` query
    #[display("azure")]
    Azure,
    /// Model in the body, bearer token
    #[display("openai")]
    OpenAi,
}

/// One configured provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Resource endpoint (Azure) or API base including `/v1` (OpenAI)
    pub base_url: String,
    pub api_key: String,
    /// Deployment (Azure) or model name (OpenAI)
    pub default_model: String,
    /// Azure only
    pub api_version: Option<String>,
}

impl ProviderConfig {
    pub fn azure(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Azure,
            base_url: endpoint.into(),
            api_key: api_key.into(),
            default_model: DEFAULT_AZURE_DEPLOYMENT.to_string(),
            api_version: Some(DEFAULT_AZURE_API_VERSION.to_string()),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: api_key.into(),
            default_model: DEFAULT_OPENAI_MODEL.to_string(),
            api_version: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Chat completions URL for `model`
    pub fn completions_url(&self, model: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.kind {
            ProviderKind::Azure => format!(
                "{base}/openai/deployments/{model}/chat/completions?api-version={}",
                self.api_version.as_deref().unwrap_or(DEFAULT_AZURE_API_VERSION)
            ),
            ProviderKind::OpenAi => format!("{base}/chat/completions"),
        }
    }
}

/// Vision API configuration
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub azure: Option<ProviderConfig>,
    pub openai: Option<ProviderConfig>,
    /// Per-call timeout against the provider
    pub request_timeout: Duration,
    /// Completion token cap
    pub max_tokens: u32,
    /// Largest accepted request body
    pub max_upload_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            azure: None,
            openai: None,
            request_timeout: Duration::from_secs(60),
            max_tokens: 800,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl VisionConfig {
    /// Read the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let (Some(endpoint), Some(key)) =
            (get("AZURE_OPENAI_ENDPOINT"), get("AZURE_OPENAI_API_KEY"))
        {
            let mut azure = ProviderConfig::azure(endpoint, key);
            if let Some(deployment) = get("AZURE_OPENAI_DEPLOYMENT") {
                azure.default_model = deployment;
            }
            if let Some(version) = get("AZURE_OPENAI_API_VERSION") {
                azure.api_version = Some(version);
            }
            config.azure = Some(azure);
        }

        if let Some(key) = get("OPENAI_API_KEY") {
            let mut openai = ProviderConfig::openai(key);
            if let Some(base_url) = get("OPENAI_BASE_URL") {
                openai.base_url = base_url;
            }
            if let Some(model) = get("OPENAI_MODEL") {
                openai.default_model = model;
            }
            config.openai = Some(openai);
        }

        if let Some(secs) = get("VISION_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = get("VISION_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            config.max_upload_bytes = bytes;
        }
        config
    }

    /// Configured provider by client-facing name
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name.trim().to_lowercase().as_str() {
            "azure" => self.azure.as_ref(),
            "openai" => self.openai.as_ref(),
            _ => None,
        }
    }

    /// Whether `name` is a provider this service speaks at all
    pub fn is_known_provider(name: &str) -> bool {
        matches!(name.trim().to_lowercase().as_str(), "azure" | "openai")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_has_no_providers() {
        let config = VisionConfig::from_lookup(|_| None);
        assert!(config.azure.is_none());
        assert!(config.openai.is_none());
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_azure_requires_endpoint_and_key() {
        let config = VisionConfig::from_lookup(lookup(&[("AZURE_OPENAI_ENDPOINT", "https://x.openai.azure.com")]));
        assert!(config.azure.is_none());

        let config = VisionConfig::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://x.openai.azure.com/"),
            ("AZURE_OPENAI_API_KEY", "secret"),
            ("AZURE_OPENAI_DEPLOYMENT", "vision-prod"),
        ]));
        let azure = config.provider("Azure").unwrap();
        assert_eq!(azure.default_model, "vision-prod");
        assert_eq!(
            azure.completions_url("vision-prod"),
            "https://x.openai.azure.com/openai/deployments/vision-prod/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_openai_overrides() {
        let config = VisionConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:9000/v1"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("VISION_REQUEST_TIMEOUT_SECS", "5"),
        ]));
        let openai = config.provider("openai").unwrap();
        assert_eq!(openai.default_model, "gpt-4o-mini");
        assert_eq!(openai.completions_url("ignored"), "http://127.0.0.1:9000/v1/chat/completions");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_provider() {
        let config = VisionConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")]));
        assert!(config.provider("gemini").is_none());
        assert!(!VisionConfig::is_known_provider("gemini"));
        assert!(VisionConfig::is_known_provider(" OpenAI "));
    }
}
