//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, http,
    http::{Method, header},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vision::{OpenAiCompatibleModel, VisionConfig, vision_router};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,vision=info,listing=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Vision providers
    let vision_config = VisionConfig::from_env();
    if vision_config.azure.is_none() && vision_config.openai.is_none() {
        tracing::warn!("No vision provider configured; analyze requests will fail");
    }
    let model = OpenAiCompatibleModel::new(Arc::new(vision_config.clone()))?;

    // Build router
    let app = Router::new()
        .merge(vision_router(model, &vision_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(
            &env::var("SNAPSELL_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        ));

    // Start server
    let port = match env::var("PORT") {
        Ok(raw) => raw.parse()?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `*` allows any origin without credentials; a comma list allows those
/// origins with credentials
fn cors_layer(raw_origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    if raw_origins.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<http::HeaderValue> = raw_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect();

    cors.allow_origin(AllowOrigin::list(allowed_origins))
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn request_with_origin(cors: CorsLayer, origin: &str) -> axum::response::Response {
        let app = Router::new().route("/health", get(|| async { "ok" })).layer(cors);
        app.oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let response = request_with_origin(cors_layer("*"), "http://anything.test").await;
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        );
    }

    #[tokio::test]
    async fn test_listed_origins_only() {
        let cors = cors_layer("http://localhost:8081, https://snapsell.app");
        let response = request_with_origin(cors.clone(), "https://snapsell.app").await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://snapsell.app"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        let response = request_with_origin(cors, "https://evil.test").await;
        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
