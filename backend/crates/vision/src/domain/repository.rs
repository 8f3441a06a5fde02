//! Vision Model Trait
//!
//! The single outbound collaborator of the vision API.

use thiserror::Error;

/// One completion request: a prompt plus one image
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    /// Provider name as sent by the client (`azure`, `openai`)
    pub provider: &'a str,
    /// Model or deployment override; the provider default otherwise
    pub model: Option<&'a str>,
    pub prompt: &'a str,
    pub image: &'a [u8],
    pub mime_type: &'a str,
}

/// Failure reported by a model backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Provider is known but its endpoint or key is missing
    #[error("Provider {0} is not configured")]
    NotConfigured(String),

    /// Request never produced an HTTP answer
    #[error("{0}")]
    Transport(String),

    /// Provider answered with an error status
    #[error("Error code: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ModelError {
    /// Billing or usage limit reached at the provider
    pub fn is_quota(&self) -> bool {
        self.to_string().to_lowercase().contains("quota")
    }

    /// Credentials missing or rejected
    pub fn is_authentication(&self) -> bool {
        if let ModelError::Api { status: 401 | 403, .. } = self {
            return true;
        }
        let text = self.to_string().to_lowercase();
        text.contains("api_key") || text.contains("api key") || text.contains("authentication")
    }
}

/// Vision-capable chat model
#[trait_variant::make(VisionModel: Send)]
pub trait LocalVisionModel {
    /// Ask the model about one image
    ///
    /// `Ok(None)` means the provider answered but produced no content.
    async fn complete(&self, request: &VisionRequest<'_>) -> Result<Option<String>, ModelError>;
}
