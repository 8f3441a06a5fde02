//! HTTP Analysis Client
//!
//! Talks to the vision API: one multipart POST per photo.

use std::time::Duration;

use kernel::fields::ListingFields;
use platform::random::ThreadRandom;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::domain::repository::AnalysisService;
use crate::domain::services::flavor::{FlavorCategory, pick};
use crate::domain::value_object::{ImagePayload, StatusReporter};
use crate::error::{AnalysisFailure, ListingError, ListingResult};

/// Path of the analysis endpoint below the base URL
pub const ANALYZE_PATH: &str = "/api/analyze-image";

#[derive(Debug, Clone)]
pub struct HttpAnalysisConfig {
    /// Vision API base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Model provider the server should use
    pub provider: String,
    /// Model override; the server default when `None`
    pub model: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Report a warming-up message when no answer arrived by then
    pub warmup_notice_after: Duration,
}

impl Default for HttpAnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            provider: "azure".to_string(),
            model: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            warmup_notice_after: Duration::from_secs(8),
        }
    }
}

impl HttpAnalysisConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Error body of the vision API
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Analysis collaborator backed by the vision API
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    http: reqwest::Client,
    url: String,
    config: HttpAnalysisConfig,
}

impl HttpAnalysisService {
    pub fn new(config: HttpAnalysisConfig) -> ListingResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ListingError::Configuration("base_url is empty".into()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ListingError::Configuration(e.to_string()))?;

        Ok(Self {
            url: format!("{base_url}{ANALYZE_PATH}"),
            http,
            config,
        })
    }

    fn form(&self, image: &ImagePayload, currency: &str) -> Result<Form, AnalysisFailure> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| AnalysisFailure::Service(e.to_string()))?;

        let mut form = Form::new()
            .part("image", part)
            .text("provider", self.config.provider.clone())
            .text("currency", currency.to_string());
        if let Some(model) = &self.config.model {
            form = form.text("model", model.clone());
        }
        Ok(form)
    }

    async fn send(
        &self,
        image: &ImagePayload,
        currency: &str,
    ) -> Result<ListingFields, AnalysisFailure> {
        let response = self
            .http
            .post(&self.url)
            .multipart(self.form(image, currency)?)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if status.is_success() {
            return response.json::<ListingFields>().await.map_err(|e| {
                if e.is_decode() {
                    AnalysisFailure::Service(format!("invalid analysis response: {e}"))
                } else {
                    transport_failure(e)
                }
            });
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or(body);
        Err(status_failure(status, detail))
    }
}

impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        image: &ImagePayload,
        currency: &str,
        cancel: &CancellationToken,
        status: &StatusReporter,
    ) -> Result<ListingFields, AnalysisFailure> {
        let request = self.send(image, currency);
        tokio::pin!(request);
        let warmup = tokio::time::sleep(self.config.warmup_notice_after);
        tokio::pin!(warmup);
        let mut warned = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnalysisFailure::Cancelled),
                result = &mut request => return result,
                _ = &mut warmup, if !warned => {
                    warned = true;
                    status.report(pick(FlavorCategory::WarmingUp, &mut ThreadRandom));
                }
            }
        }
    }
}

fn transport_failure(e: reqwest::Error) -> AnalysisFailure {
    if e.is_timeout() {
        AnalysisFailure::Timeout
    } else if e.is_connect() || e.is_request() {
        AnalysisFailure::Network(e.to_string())
    } else {
        AnalysisFailure::Service(e.to_string())
    }
}

fn status_failure(status: StatusCode, detail: String) -> AnalysisFailure {
    match status {
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => AnalysisFailure::Quota(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AnalysisFailure::Timeout,
        StatusCode::SERVICE_UNAVAILABLE => AnalysisFailure::Network(detail),
        _ => AnalysisFailure::Service(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers one request with `status` and `body` after `delay`
    async fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + length
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![1, 2, 3], "image/jpeg", "photo.jpg")
    }

    #[tokio::test]
    async fn test_success_decodes_fields() {
        let base = serve_once(
            "200 OK",
            r#"{"title":"Desk lamp","price":"25","condition":"Used - Good","pickupAvailable":true}"#,
            Duration::ZERO,
        )
        .await;
        let service = HttpAnalysisService::new(HttpAnalysisConfig::new(base)).unwrap();

        let fields = service
            .analyze(&image(), "$", &CancellationToken::new(), &StatusReporter::none())
            .await
            .unwrap();
        assert_eq!(fields.title, "Desk lamp");
        assert_eq!(fields.price, "25");
        assert!(fields.pickup_available);
    }

    #[tokio::test]
    async fn test_error_statuses_are_mapped() {
        let base = serve_once("429 Too Many Requests", r#"{"detail":"Daily limit"}"#, Duration::ZERO).await;
        let service = HttpAnalysisService::new(HttpAnalysisConfig::new(base)).unwrap();
        let err = service
            .analyze(&image(), "$", &CancellationToken::new(), &StatusReporter::none())
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisFailure::Quota("Daily limit".into()));

        let base = serve_once(
            "502 Bad Gateway",
            r#"{"detail":"Vision model error: boom"}"#,
            Duration::ZERO,
        )
        .await;
        let service = HttpAnalysisService::new(HttpAnalysisConfig::new(base)).unwrap();
        let err = service
            .analyze(&image(), "$", &CancellationToken::new(), &StatusReporter::none())
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisFailure::Service("Vision model error: boom".into()));
    }

    #[tokio::test]
    async fn test_slow_answer_reports_warmup_once() {
        let base = serve_once("200 OK", r#"{"title":"Bike"}"#, Duration::from_millis(300)).await;
        let config = HttpAnalysisConfig {
            warmup_notice_after: Duration::from_millis(50),
            ..HttpAnalysisConfig::new(base)
        };
        let service = HttpAnalysisService::new(config).unwrap();
        let (reporter, mut rx) = StatusReporter::channel();

        let fields = service
            .analyze(&image(), "$", &CancellationToken::new(), &reporter)
            .await
            .unwrap();
        assert_eq!(fields.title, "Bike");

        let message = rx.try_recv().unwrap();
        assert!(FlavorCategory::WarmingUp.messages().contains(&message.as_str()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_token_returns_cancelled() {
        let base = serve_once("200 OK", "{}", Duration::from_secs(30)).await;
        let service = HttpAnalysisService::new(HttpAnalysisConfig::new(base)).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = service
            .analyze(&image(), "$", &token, &StatusReporter::none())
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisFailure::Cancelled);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service =
            HttpAnalysisService::new(HttpAnalysisConfig::new(format!("http://{addr}"))).unwrap();
        let err = service
            .analyze(&image(), "$", &CancellationToken::new(), &StatusReporter::none())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisFailure::Network(_)));
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        assert!(matches!(
            HttpAnalysisService::new(HttpAnalysisConfig::new("  ")),
            Err(ListingError::Configuration(_))
        ));
    }
}
