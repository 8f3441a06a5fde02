//! Vision Router

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::application::config::VisionConfig;
use crate::domain::repository::VisionModel;
use crate::infra::openai::OpenAiCompatibleModel;
use crate::presentation::handlers::{self, VisionAppState};

/// Create the vision router with the OpenAI-compatible model client
pub fn vision_router(model: OpenAiCompatibleModel, config: &VisionConfig) -> Router {
    vision_router_generic(model, config)
}

/// Create a generic vision router for any model implementation
pub fn vision_router_generic<M>(model: M, config: &VisionConfig) -> Router
where
    M: VisionModel + Sync + 'static,
{
    let state = VisionAppState {
        model: Arc::new(model),
    };

    Router::new()
        .route(
            "/api/analyze-image",
            post(handlers::analyze_image::<M>).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
