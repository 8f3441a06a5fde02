//! OpenAI-compatible Chat Completions Client
//!
//! Speaks both the Azure OpenAI dialect (deployment in the path, `api-key`
//! header) and the plain OpenAI one (model in the body, bearer token). The
//! photo travels inline as a base64 `data:` URL.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::application::config::{ProviderKind, VisionConfig};
use crate::domain::repository::{ModelError, VisionModel, VisionRequest};

/// Longest provider error body carried into a message
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Vision model over any OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleModel {
    http: reqwest::Client,
    config: Arc<VisionConfig>,
}

impl OpenAiCompatibleModel {
    pub fn new(config: Arc<VisionConfig>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

impl VisionModel for OpenAiCompatibleModel {
    async fn complete(&self, request: &VisionRequest<'_>) -> Result<Option<String>, ModelError> {
        if !VisionConfig::is_known_provider(request.provider) {
            return Err(ModelError::UnsupportedProvider(request.provider.to_string()));
        }
        let provider = self
            .config
            .provider(request.provider)
            .ok_or_else(|| ModelError::NotConfigured(request.provider.to_string()))?;

        let model = request
            .model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&provider.default_model);

        let body = ChatRequest {
            model: (provider.kind == ProviderKind::OpenAi).then_some(model),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(request.mime_type, request.image),
                        },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
        };

        let builder = self.http.post(provider.completions_url(model)).json(&body);
        let builder = match provider.kind {
            ProviderKind::Azure => builder.header("api-key", &provider.api_key),
            ProviderKind::OpenAi => builder.bearer_auth(&provider.api_key),
        };

        tracing::debug!(provider = %provider.kind, model = %model, "Calling vision model");

        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Transport(e.without_url().to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Provider error text, with its code when the message lacks it
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => {
            let code = match error.code {
                Some(serde_json::Value::String(code)) => code,
                Some(serde_json::Value::Number(code)) => code.to_string(),
                _ => String::new(),
            };
            if code.is_empty() || error.message.contains(&code) {
                error.message
            } else {
                format!("{} ({code})", error.message)
            }
        }
        Err(_) => body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
