//! Google Gemini client using the `generateContent` REST endpoint

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::retry::is_transient;
use super::{LanguageModel, ModelError};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini language model
pub struct GeminiClient {
    api_key: SecretString,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a client for `model`
    #[must_use]
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Point the client at a different API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "sending prompt to Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(classify_transport)?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Other(format!("malformed response: {e}")))?;

        extract_text(parsed)
    }
}

/// Map a transport failure to a model error
fn classify_transport(err: reqwest::Error) -> ModelError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        ModelError::Transient(err.to_string())
    } else {
        ModelError::Other(err.to_string())
    }
}

/// Map a non-success HTTP response to a model error
fn classify_status(status: u16, body: &str) -> ModelError {
    let lower = body.to_lowercase();
    let summary = format!("HTTP {status}: {}", body.chars().take(200).collect::<String>());

    if status == 401
        || status == 403
        || lower.contains("api_key_invalid")
        || lower.contains("api key not valid")
    {
        ModelError::InvalidCredentials(summary)
    } else if status == 429 || lower.contains("quota") || lower.contains("resource_exhausted") {
        ModelError::QuotaExhausted(summary)
    } else if lower.contains("safety") || lower.contains("blocked") {
        ModelError::ContentBlocked(summary)
    } else if is_transient(status, body) {
        ModelError::Transient(summary)
    } else {
        ModelError::Other(summary)
    }
}

/// Pull the reply text out of a parsed response
fn extract_text(response: GenerateResponse) -> std::result::Result<String, ModelError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::ContentBlocked(reason));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ModelError::Other("response had no candidates".to_string()));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT") => Err(ModelError::ContentBlocked(
                "candidate stopped for safety".to_string(),
            )),
            _ => Err(ModelError::Other("empty reply".to_string())),
        };
    }

    Ok(text)
}
