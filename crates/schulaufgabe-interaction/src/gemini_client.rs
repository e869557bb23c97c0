//! GeminiInferenceClient - Direct REST API implementation for Gemini.
//!
//! Sends one `generateContent` request carrying the worksheet image as inline
//! data followed by the instructional prompt, and returns the first text part of
//! the response.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use schulaufgabe_core::config::DEFAULT_GEMINI_MODEL;
use schulaufgabe_core::error::{PipelineError, Result};
use schulaufgabe_core::inference::InferenceClient;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const PROMPT_LOG_CHARS: usize = 200;

/// Inference client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiInferenceClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiInferenceClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Creates a client for the default model.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_GEMINI_MODEL)
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at a different API root (used for local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_request(image: &[u8], mime_type: &str, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: mime_type.to_string(),
                            data: BASE64_STANDARD.encode(image),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        }
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent",
            self.base_url,
            model = self.model,
        );

        // Key goes in a header so it never shows up in reqwest's URL-bearing errors.
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                PipelineError::upstream(format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            PipelineError::upstream(format!("Failed to parse Gemini response: {}", err.without_url()))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl InferenceClient for GeminiInferenceClient {
    async fn infer(&self, image: &[u8], mime_type: &str, prompt: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::config("Gemini API key not set"));
        }

        tracing::info!("[Gemini] Using model: {}", self.model);
        tracing::info!("[Gemini] Prompt: {}", truncate_for_log(prompt, PROMPT_LOG_CHARS));
        tracing::info!("[Gemini] Image size: {} bytes", image.len());

        let request = Self::build_request(image, mime_type, prompt);
        let text = self.send_request(&request).await?;

        tracing::info!("[Gemini] Response text length: {}", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenates the text parts of the first candidate.
///
/// Missing candidates, missing content and whitespace-only text are all
/// `Upstream` errors; a block reason or finish reason is included when present.
fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    let block_reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);

    let candidate = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next());

    let finish_reason = candidate
        .as_ref()
        .and_then(|candidate| candidate.finish_reason.clone());

    let text: String = candidate
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    let mut message = "No LaTeX returned from Gemini API".to_string();
    if let Some(reason) = block_reason {
        message.push_str(&format!(" (prompt blocked: {})", reason));
    } else if let Some(reason) = finish_reason {
        message.push_str(&format!(" (finish reason: {})", reason));
    }
    Err(PipelineError::upstream(message))
}

fn map_http_error(status: StatusCode, body: String) -> PipelineError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    PipelineError::upstream(format!("HTTP {}: {}", status.as_u16(), message))
}

fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
