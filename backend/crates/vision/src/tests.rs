//! Router-level tests for the vision API

#[cfg(test)]
mod router_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::application::config::VisionConfig;
    use crate::domain::repository::{ModelError, VisionModel, VisionRequest};
    use crate::presentation::router::vision_router_generic;

    const BOUNDARY: &str = "snapsell-test-boundary";

    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        provider: String,
        model: Option<String>,
        mime_type: String,
        image_len: usize,
    }

    struct FakeModel {
        answer: Result<Option<String>, ModelError>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl FakeModel {
        fn answering(answer: Result<Option<String>, ModelError>) -> (Self, Arc<Mutex<Vec<Seen>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    answer,
                    seen: seen.clone(),
                },
                seen,
            )
        }
    }

    impl VisionModel for FakeModel {
        async fn complete(&self, request: &VisionRequest<'_>) -> Result<Option<String>, ModelError> {
            self.seen.lock().unwrap().push(Seen {
                provider: request.provider.to_string(),
                model: request.model.map(str::to_string),
                mime_type: request.mime_type.to_string(),
                image_len: request.image.len(),
            });
            self.answer.clone()
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File {
            name: &'a str,
            content_type: &'a str,
            bytes: &'a [u8],
        },
    }

    fn multipart(parts: &[Part<'_>]) -> Body {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File {
                    name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"photo.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn analyze_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze-image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart(parts))
            .unwrap()
    }

    fn photo() -> Part<'static> {
        Part::File {
            name: "image",
            content_type: "image/jpeg",
            bytes: b"\xff\xd8\xff\xe0jpeg",
        }
    }

    fn app(answer: Result<Option<String>, ModelError>) -> (Router, Arc<Mutex<Vec<Seen>>>) {
        let (model, seen) = FakeModel::answering(answer);
        (vision_router_generic(model, &VisionConfig::default()), seen)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Ok(None));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_analyze_happy_path() {
        let (app, seen) = app(Ok(Some(
            "```json\n{\"title\":\"Oak chair\",\"price\":45,\"condition\":\"Used - Good\",\"pickupAvailable\":\"yes\"}\n```"
                .into(),
        )));
        let (status, body) = send(
            app,
            analyze_request(&[
                photo(),
                Part::Text("provider", "openai"),
                Part::Text("model", "gpt-4o-mini"),
                Part::Text("currency", "€"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Oak chair");
        assert_eq!(body["price"], "45");
        assert_eq!(body["description"], "");
        assert_eq!(body["pickupAvailable"], true);
        assert_eq!(body["shippingAvailable"], false);

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0],
            Seen {
                provider: "openai".into(),
                model: Some("gpt-4o-mini".into()),
                mime_type: "image/jpeg".into(),
                image_len: 8,
            }
        );
    }

    #[tokio::test]
    async fn test_provider_defaults_to_azure() {
        let (app, seen) = app(Ok(Some("{}".into())));
        let (status, _) = send(app, analyze_request(&[photo(), Part::Text("model", "  ")])).await;
        assert_eq!(status, StatusCode::OK);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].provider, "azure");
        assert_eq!(seen[0].model, None);
    }

    #[tokio::test]
    async fn test_non_image_upload_is_rejected_before_the_model() {
        let (app, seen) = app(Ok(Some("{}".into())));
        let (status, body) = send(
            app,
            analyze_request(&[Part::File {
                name: "image",
                content_type: "application/pdf",
                bytes: b"%PDF",
            }]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Please upload an image file.");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let (app, _) = app(Ok(Some("{}".into())));
        let (status, body) = send(app, analyze_request(&[Part::Text("provider", "azure")])).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "Missing form field: image");
    }

    #[tokio::test]
    async fn test_empty_model_answer_is_bad_gateway() {
        let (app, _) = app(Ok(Some("   ".into())));
        let (status, body) = send(app, analyze_request(&[photo()])).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["detail"], "Vision model failed to return a response.");
    }

    #[tokio::test]
    async fn test_model_failures_map_to_detail_messages() {
        let cases = [
            (
                ModelError::Api {
                    status: 429,
                    message: "insufficient_quota".into(),
                },
                "API quota exceeded. Please check your azure account billing",
            ),
            (
                ModelError::Api {
                    status: 401,
                    message: "Access denied".into(),
                },
                "API authentication failed. Please check your azure API key",
            ),
            (
                ModelError::Transport("connection refused".into()),
                "Vision model error: connection refused",
            ),
        ];
        for (error, prefix) in cases {
            let (app, _) = app(Err(error));
            let (status, body) = send(app, analyze_request(&[photo()])).await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            let detail = body["detail"].as_str().unwrap();
            assert!(detail.starts_with(prefix), "unexpected detail: {detail}");
        }
    }

    #[tokio::test]
    async fn test_unparsable_output_is_server_error() {
        let (app, _) = app(Ok(Some("Sorry, I can't help with that.".into())));
        let (status, body) = send(app, analyze_request(&[photo()])).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "Failed to parse model output as JSON. Raw response: Sorry, I can't help with that."
        );
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let (model, seen) = FakeModel::answering(Ok(Some("{}".into())));
        let config = VisionConfig {
            max_upload_bytes: 64,
            ..Default::default()
        };
        let app = vision_router_generic(model, &config);
        let big = vec![0u8; 1024];
        let response = app
            .oneshot(analyze_request(&[Part::File {
                name: "image",
                content_type: "image/png",
                bytes: &big,
            }]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(seen.lock().unwrap().is_empty());
    }
}
