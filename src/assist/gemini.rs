//! Gemini completion client.
//!
//! Posts one `generateContent` call per request. The API key is read from
//! the environment on every call, so a missing key is reported before any
//! network traffic.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::assist::client::{AssistError, CompletionRequest, CompletionService};
use crate::assist::ranking::truncate_for_log;

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Model name (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    /// Temperature for generation (0.0 - 2.0).
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.4,
            timeout_secs: 30,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

/// Gemini completion client.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AssistError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn api_key(&self) -> Result<String, AssistError> {
        match std::env::var(&self.config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(AssistError::MissingCredentials(self.config.api_key_env.clone())),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> GeminiRequest {
        let (response_mime_type, response_schema) = match &request.response_schema {
            Some(schema) => (Some("application/json".to_string()), Some(schema.clone())),
            None => (None, None),
        };
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                response_mime_type,
                response_schema,
            },
        }
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

/// Concatenated text of the first candidate
fn extract_text(parsed: GeminiResponse) -> Result<String, AssistError> {
    if let Some(error) = parsed.error {
        return Err(AssistError::Response(format!("Gemini API error: {}", error.message)));
    }
    let text: String = parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AssistError::Response("No content in response".to_string()));
    }
    Ok(text)
}

impl CompletionService for GeminiClient {
    fn generate(&self, request: &CompletionRequest) -> Result<String, AssistError> {
        let api_key = self.api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key_header = HeaderValue::from_str(&api_key)
            .map_err(|_| AssistError::InvalidCredentials(self.config.api_key_env.clone()))?;
        headers.insert("x-goog-api-key", key_header);

        let body = self.build_body(request);
        log::debug!(
            "gemini request: model={} structured={} prompt_len={}",
            self.config.model,
            request.response_schema.is_some(),
            request.prompt.len()
        );

        let response = self
            .client
            .post(self.build_url())
            .headers(headers)
            .json(&body)
            .send()
            .map_err(|e| AssistError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(AssistError::Response(format!(
                "HTTP {}: {}",
                status,
                truncate_for_log(&text, MAX_ERROR_BODY_CHARS)
            )));
        }

        let text = response.text().map_err(|e| AssistError::Http(e.to_string()))?;
        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| AssistError::Malformed(e.to_string()))?;
        extract_text(parsed)
    }
}
