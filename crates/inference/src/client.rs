//! HTTP client for the external chat-completion endpoint.

use crate::{prompt, validate, Engine, InferenceError};
use async_trait::async_trait;
use era_types::{ChatMessage, DiagnosisResult, PatientAttributes};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the model endpoint, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ModelConfig {
    /// Creates a new `ModelConfig`. A trailing slash on `base_url` is
    /// tolerated and stripped.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Outbound message in the completion request body.
#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionReq<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionRes {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-style `/chat/completions` endpoint.
///
/// One request in, one response out: no retries, no streaming, no caching.
/// Every request is bounded by the configured transport timeout, and
/// upstream failures are classified into the three outward-facing error
/// conditions (rate-limited, payment required, generic failure) before they
/// reach the caller.
pub struct ModelClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    /// Builds the client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ModelConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Submits one completion request and returns the raw message content.
    async fn complete(
        &self,
        messages: &[WireMessage],
        json_mode: bool,
    ) -> Result<String, InferenceError> {
        let body = CompletionReq {
            model: &self.config.model,
            messages,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
            temperature: 0.2,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(InferenceError::UpstreamRateLimited);
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(InferenceError::UpstreamPayment);
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "model endpoint returned failure");
            return Err(InferenceError::UpstreamStatus(status.as_u16()));
        }

        let completion: CompletionRes = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(InferenceError::EmptyResponse)
    }
}

#[async_trait]
impl Engine for ModelClient {
    async fn analyze(
        &self,
        patient: &PatientAttributes,
    ) -> Result<DiagnosisResult, InferenceError> {
        // Reject locally before spending an upstream call.
        validate::require_attributes(patient)?;

        let messages = [
            WireMessage {
                role: "system",
                content: prompt::DIAGNOSIS_SYSTEM_PROMPT.to_string(),
            },
            WireMessage {
                role: "user",
                content: prompt::patient_summary(patient),
            },
        ];

        let raw = self.complete(&messages, true).await?;
        validate::parse_diagnosis(&raw)
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, InferenceError> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: prompt::CHAT_SYSTEM_PROMPT.to_string(),
        });
        wire.extend(messages.iter().map(|message| WireMessage {
            role: message.role.as_str(),
            content: message.content.clone(),
        }));

        self.complete(&wire, false).await
    }
}
