//! Vision API Error Types
//!
//! Defines [`VisionError`] and its integration with `kernel::error::AppError`.
//! Response bodies keep the `{"detail": ...}` shape existing clients parse.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Vision-specific result type alias
pub type VisionResult<T> = Result<T, VisionError>;

/// At most this many characters of raw model output are echoed back
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Vision API errors
#[derive(Debug, Error)]
pub enum VisionError {
    /// Upload is missing a content type or is not an image
    #[error("Please upload an image file.")]
    NotAnImage,

    /// A required form field was not sent
    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    /// Multipart body could not be read
    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    /// Upload exceeds the configured body limit
    #[error("Image is too large.")]
    TooLarge,

    /// Provider rejected the call for billing or usage reasons
    #[error(
        "API quota exceeded. Please check your {provider} account billing and usage limits. Error: {message}"
    )]
    ProviderQuota { provider: String, message: String },

    /// Provider rejected the credentials
    #[error("API authentication failed. Please check your {provider} API key in .env. Error: {message}")]
    ProviderAuth { provider: String, message: String },

    /// Any other model failure
    #[error("Vision model error: {0}")]
    Model(String),

    /// Model answered without content
    #[error("Vision model failed to return a response.")]
    EmptyResponse,

    /// Model output is not a JSON object
    #[error("Failed to parse model output as JSON. Raw response: {excerpt}")]
    UnparsableOutput { excerpt: String },
}

impl VisionError {
    /// Parse failure carrying a bounded excerpt of what the model said
    pub fn unparsable(raw: &str) -> Self {
        VisionError::UnparsableOutput {
            excerpt: raw.chars().take(RAW_EXCERPT_CHARS).collect(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            VisionError::NotAnImage | VisionError::Multipart(_) => StatusCode::BAD_REQUEST,
            VisionError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VisionError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            VisionError::ProviderQuota { .. }
            | VisionError::ProviderAuth { .. }
            | VisionError::Model(_)
            | VisionError::EmptyResponse => StatusCode::BAD_GATEWAY,
            VisionError::UnparsableOutput { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VisionError::NotAnImage
            | VisionError::MissingField(_)
            | VisionError::Multipart(_)
            | VisionError::TooLarge => ErrorKind::BadRequest,
            VisionError::ProviderQuota { .. }
            | VisionError::ProviderAuth { .. }
            | VisionError::Model(_)
            | VisionError::EmptyResponse => ErrorKind::BadGateway,
            VisionError::UnparsableOutput { .. } => ErrorKind::Unknown,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            VisionError::ProviderQuota { provider, message } => {
                tracing::error!(provider = %provider, message = %message, "Vision provider quota exceeded");
            }
            VisionError::ProviderAuth { provider, message } => {
                tracing::error!(provider = %provider, message = %message, "Vision provider authentication failed");
            }
            VisionError::Model(message) => {
                tracing::error!(message = %message, "Vision model error");
            }
            VisionError::EmptyResponse => {
                tracing::warn!("Vision model returned no content");
            }
            VisionError::UnparsableOutput { excerpt } => {
                tracing::warn!(excerpt = %excerpt, "Model output is not JSON");
            }
            _ => {
                tracing::debug!(error = %self, "Rejected analyze request");
            }
        }
    }
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        let kind = err.kind();
        match err {
            VisionError::NotAnImage | VisionError::MissingField(_) => {
                AppError::bad_request(err.to_string())
            }
            other => AppError::from_kind(kind).with_source(other),
        }
    }
}

impl IntoResponse for VisionError {
    fn into_response(self) -> Response {
        self.log();
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
