//! Data Transfer Objects

use serde::Serialize;

use crate::application::analyze_image::AnalyzeImageInput;
use crate::application::config::DEFAULT_PROVIDER;
use crate::error::{VisionError, VisionResult};

/// Fields collected from the analyze form
///
/// Unknown parts (e.g. `currency`) are accepted and ignored.
#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub image: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl AnalyzeForm {
    pub fn into_input(self) -> VisionResult<AnalyzeImageInput> {
        let image = self.image.ok_or(VisionError::MissingField("image"))?;
        Ok(AnalyzeImageInput {
            image,
            content_type: self.content_type,
            provider: self
                .provider
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            model: self
                .model
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
