//! Model gateway
//!
//! Thin adapter between the session store and the hosted Google Generative
//! Language API (Gemini). The [`ConversationHandle`] owns the provider-side
//! conversation context, so the gateway never re-sends the display
//! transcript: each `send` carries the handle's own history, exactly as the
//! provider's chat-session objects do.

use crate::config::Config;
use crate::error::{ChatError, ChatResult};
use crate::util::sanitize_credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::CONTENT_TYPE, Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque ownership of one remote conversation, tied to one credential.
///
/// Exclusively owned by a session; invalidated when the session is cleared
/// or the credential changes. The handle carries the provider-side history
/// (the wire-format turns already exchanged), which is extended only after
/// a successful reply — a failed send leaves the remote context untouched.
#[derive(Debug, Clone)]
pub struct ConversationHandle {
    id: Uuid,
    model: String,
    credential: String,
    opened_at: DateTime<Utc>,
    history: Vec<GeminiContent>,
}

impl ConversationHandle {
    /// Create a handle with empty history for `model`, bound to `credential`
    pub fn new(model: impl Into<String>, credential: impl Into<String>) -> Self {
        ConversationHandle {
            id: Uuid::new_v4(),
            model: model.into(),
            credential: credential.into(),
            opened_at: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Unique id of this conversation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Model the conversation was opened against
    pub fn model(&self) -> &str {
        &self.model
    }

    /// When the conversation was opened
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Number of wire-format turns accumulated so far
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Record one completed exchange in the provider-side history
    fn record(&mut self, user: GeminiContent, model: GeminiContent) {
        self.history.push(user);
        self.history.push(model);
    }
}

/// Trait for conversational model gateways
///
/// The session store is written against this seam so it can be exercised
/// with a scripted gateway in tests.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Establish a conversation context with empty history.
    ///
    /// Fails with [`ChatError::InvalidCredential`] when the credential is
    /// missing, malformed, or rejected by the remote service, and with
    /// [`ChatError::ServiceUnavailable`] on transport or initialization
    /// failure.
    async fn open(&self, credential: &str) -> ChatResult<ConversationHandle>;

    /// Submit one user text to the open conversation and return the
    /// model's reply.
    ///
    /// Any transport, quota, or content-policy failure maps to
    /// [`ChatError::RequestFailed`] and leaves the handle's history as it
    /// was before the call.
    async fn send(&self, handle: &mut ConversationHandle, text: &str) -> ChatResult<String>;
}

/// Gateway to the Google Generative Language API
pub struct GeminiGateway {
    http_client: HttpClient,
    base_url: String,
    model: String,
}

impl GeminiGateway {
    /// Create a gateway from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GeminiGateway {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn open(&self, credential: &str) -> ChatResult<ConversationHandle> {
        let key = sanitize_credential(credential)?;

        // Probe the model endpoint so a bad key or unreachable service is
        // reported at open time rather than on the first send.
        let url = format!(
            "{}/v1beta/models/{}?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&key)
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::ServiceUnavailable {
                message: e.to_string(),
            })?;

        match response.status() {
            StatusCode::OK => {
                let handle = ConversationHandle::new(&self.model, key);
                info!(conversation = %handle.id(), model = %self.model, "conversation opened");
                Ok(handle)
            }
            status => Err(classify_open_failure(
                status,
                extract_api_error(response).await,
            )),
        }
    }

    async fn send(&self, handle: &mut ConversationHandle, text: &str) -> ChatResult<String> {
        let user = GeminiContent::user(text);
        let mut contents = handle.history.clone();
        contents.push(user.clone());

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            handle.model,
            urlencoding::encode(&handle.credential)
        );

        debug!(
            conversation = %handle.id(),
            turns = contents.len(),
            "dispatching generateContent"
        );

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&GenerateContentRequest { contents })
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(classify_send_failure(
                status,
                extract_api_error(response).await,
            ));
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(|e| ChatError::RequestFailed {
                status: Some(status.as_u16()),
                message: format!("malformed response body: {}", e),
            })?;

        let reply = extract_reply(&body)?;
        handle.record(user, GeminiContent::model(&reply));
        Ok(reply)
    }
}

/// Map a non-OK status from the open-time model probe onto the error
/// taxonomy: the 400/401/403 family is a rejected credential, anything
/// else means the service cannot be reached usefully
fn classify_open_failure(status: StatusCode, detail: String) -> ChatError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ChatError::InvalidCredential { reason: detail }
        }
        status => ChatError::ServiceUnavailable {
            message: format!("model probe failed ({}): {}", status, detail),
        },
    }
}

/// Every non-OK status during a send is a failed request, whatever the
/// underlying cause (transport, quota, content policy)
fn classify_send_failure(status: StatusCode, detail: String) -> ChatError {
    ChatError::RequestFailed {
        status: Some(status.as_u16()),
        message: detail,
    }
}

/// Pull the generated text out of a response, treating an empty candidate
/// list (typically a blocked prompt) as a failed request
fn extract_reply(body: &GenerateContentResponse) -> ChatResult<String> {
    body.candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .map(|p| p.text.clone())
        .ok_or_else(|| ChatError::RequestFailed {
            status: Some(200),
            message: "response contained no generated text (prompt may have been blocked)"
                .to_string(),
        })
}

/// Best-effort extraction of the `error.message` field from an API error
/// body
async fn extract_api_error(response: reqwest::Response) -> String {
    let body: Option<serde_json::Value> = response.json().await.ok();
    body.as_ref()
        .and_then(|v| v.get("error").and_then(|e| e.get("message")))
        .and_then(|v| v.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

// Gemini API wire types

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(text: impl Into<String>) -> Self {
        GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }

    fn model(text: impl Into<String>) -> Self {
        GeminiContent {
            role: "model".to_string(),
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = GenerateContentRequest {
            contents: vec![GeminiContent::user("Hello"), GeminiContent::model("Hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hello" }] },
                    { "role": "model", "parts": [{ "text": "Hi" }] },
                ]
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Hi there" }]
                    },
                    "finishReason": "STOP"
                }
            ]
        }"#;
        let body: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_reply(&body).unwrap(), "Hi there");
    }

    #[test]
    fn test_empty_candidates_is_request_failed() {
        let body: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            extract_reply(&body),
            Err(ChatError::RequestFailed { .. })
        ));
    }

    #[test]
    fn test_open_status_mapping() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
        ] {
            let error = classify_open_failure(status, "API key not valid".to_string());
            match error {
                ChatError::InvalidCredential { reason } => {
                    assert_eq!(reason, "API key not valid")
                }
                other => panic!("{status} should reject the credential, got {other:?}"),
            }
        }

        for status in [
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let error = classify_open_failure(status, "backend down".to_string());
            match error {
                ChatError::ServiceUnavailable { message } => {
                    assert!(message.contains(&status.as_u16().to_string()));
                    assert!(message.contains("backend down"));
                }
                other => panic!("{status} should be service-unavailable, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_send_status_mapping() {
        let error = classify_send_failure(StatusCode::TOO_MANY_REQUESTS, "quota".to_string());
        match error {
            ChatError::RequestFailed { status, message } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "quota");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }

        // A credential rejected mid-conversation is still just a failed
        // request; only open reports InvalidCredential.
        assert!(matches!(
            classify_send_failure(StatusCode::UNAUTHORIZED, "expired".to_string()),
            ChatError::RequestFailed {
                status: Some(401),
                ..
            }
        ));
    }

    #[test]
    fn test_handle_records_exchanges() {
        let mut handle = ConversationHandle::new("gemini-1.5-flash", "key");
        assert_eq!(handle.history_len(), 0);

        handle.record(GeminiContent::user("A"), GeminiContent::model("B"));
        assert_eq!(handle.history_len(), 2);
        assert_eq!(handle.model(), "gemini-1.5-flash");
    }
}
