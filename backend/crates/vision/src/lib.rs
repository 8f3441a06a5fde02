//! Vision API Module
//!
//! Turns one uploaded photo into listing fields by asking a vision-capable
//! language model.
//!
//! Clean Architecture structure:
//! - `domain/` - Prompt, model output normalization, model trait
//! - `application/` - Analyze-image use case, configuration
//! - `infra/` - OpenAI-compatible chat completions client
//! - `presentation/` - HTTP handlers
//!
//! ## Trust Model
//! - Model output is untrusted text; only the normalized fields leave the service
//! - Provider errors are reported as 502 with a detail message; the client
//!   decides what reaches the user

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{ProviderConfig, ProviderKind, VisionConfig};
pub use error::{VisionError, VisionResult};
pub use infra::openai::OpenAiCompatibleModel;
pub use presentation::router::{vision_router, vision_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::repository::VisionRequest;
    pub use crate::presentation::dto::*;
    pub use kernel::fields::ListingFields;
}

#[cfg(test)]
mod tests;
