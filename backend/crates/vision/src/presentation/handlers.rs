//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use kernel::fields::ListingFields;

use crate::application::analyze_image::AnalyzeImageUseCase;
use crate::domain::repository::VisionModel;
use crate::error::{VisionError, VisionResult};
use crate::presentation::dto::{AnalyzeForm, HealthResponse};

/// Shared state for vision handlers
pub struct VisionAppState<M> {
    pub model: Arc<M>,
}

impl<M> Clone for VisionAppState<M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
        }
    }
}

/// POST /api/analyze-image
pub async fn analyze_image<M>(
    State(state): State<VisionAppState<M>>,
    multipart: Multipart,
) -> VisionResult<Json<ListingFields>>
where
    M: VisionModel + Sync + 'static,
{
    let form = read_form(multipart).await?;
    let use_case = AnalyzeImageUseCase::new(state.model.clone());
    let fields = use_case.execute(form.into_input()?).await?;
    Ok(Json(fields))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn read_form(mut multipart: Multipart) -> VisionResult<AnalyzeForm> {
    let mut form = AnalyzeForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("image") => {
                form.content_type = field.content_type().map(str::to_string);
                form.image = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            Some("provider") => form.provider = Some(field.text().await.map_err(multipart_error)?),
            Some("model") => form.model = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }
    Ok(form)
}

fn multipart_error(err: MultipartError) -> VisionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return VisionError::TooLarge;
    }
    VisionError::Multipart(err.body_text())
}
