//! Analyze Image Use Case

use std::sync::Arc;

use kernel::fields::ListingFields;

use crate::domain::normalize::normalize_model_output;
use crate::domain::prompt::LISTING_PROMPT;
use crate::domain::repository::{ModelError, VisionModel, VisionRequest};
use crate::error::{VisionError, VisionResult};

/// Input DTO for analyze image
#[derive(Debug, Clone)]
pub struct AnalyzeImageInput {
    pub image: Vec<u8>,
    /// Declared content type of the upload
    pub content_type: Option<String>,
    pub provider: String,
    pub model: Option<String>,
}

/// Analyze Image Use Case
pub struct AnalyzeImageUseCase<M>
where
    M: VisionModel,
{
    model: Arc<M>,
}

impl<M> AnalyzeImageUseCase<M>
where
    M: VisionModel + Sync,
{
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    pub async fn execute(&self, input: AnalyzeImageInput) -> VisionResult<ListingFields> {
        let mime_type = match input.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct,
            _ => return Err(VisionError::NotAnImage),
        };

        let request = VisionRequest {
            provider: &input.provider,
            model: input.model.as_deref(),
            prompt: LISTING_PROMPT,
            image: &input.image,
            mime_type,
        };

        let raw = self
            .model
            .complete(&request)
            .await
            .map_err(|e| model_failure(&input.provider, e))?
            .filter(|text| !text.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)?;

        let fields = normalize_model_output(&raw)?;

        tracing::info!(
            provider = %input.provider,
            bytes = input.image.len(),
            has_title = !fields.title.is_empty(),
            has_price = !fields.price.is_empty(),
            "Analyzed image"
        );

        Ok(fields)
    }
}

/// Wrap a model failure in the detail clients get to see
fn model_failure(provider: &str, err: ModelError) -> VisionError {
    let message = err.to_string();
    if err.is_quota() {
        VisionError::ProviderQuota {
            provider: provider.to_string(),
            message,
        }
    } else if err.is_authentication() {
        VisionError::ProviderAuth {
            provider: provider.to_string(),
            message,
        }
    } else {
        VisionError::Model(message)
    }
}
