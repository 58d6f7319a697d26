//! Image generation API client.
//!
//! [`ImageGenerator`] is the seam the orchestrator depends on. [`GeminiClient`]
//! implements it over HTTPS with a blocking `reqwest` client; tests substitute
//! scripted fakes.

use super::error::UpstreamError;
use crate::config::GenerationConfig;
use crate::error::PosterError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A generation backend: text prompt in, candidates with image bytes out.
pub trait ImageGenerator {
    fn generate(&self, prompt: &str) -> Result<GenerationResponse, UpstreamError>;
}

impl<T: ImageGenerator + ?Sized> ImageGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<GenerationResponse, UpstreamError> {
        (**self).generate(prompt)
    }
}

impl<T: ImageGenerator + ?Sized> ImageGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<GenerationResponse, UpstreamError> {
        (**self).generate(prompt)
    }
}

/// Decoded response of one generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

impl GenerationResponse {
    /// Response with a single candidate holding one image part.
    pub fn with_image(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            candidates: vec![Candidate {
                parts: vec![Part::InlineImage {
                    mime_type: mime_type.into(),
                    data,
                }],
            }],
        }
    }

    /// Parts of the first candidate; the API may return more than one.
    pub fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Image payloads of the first candidate, in response order.
    pub fn images(&self) -> impl Iterator<Item = &[u8]> {
        self.first_parts().iter().filter_map(|part| match part {
            Part::InlineImage { data, .. } if !data.is_empty() => Some(data.as_slice()),
            _ => None,
        })
    }

    /// Text parts of the first candidate (model commentary).
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.first_parts().iter().filter_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

// Wire format

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    contents: Vec<ApiRequestContent<'a>>,
    generation_config: ApiGenerationConfig,
}

#[derive(Serialize)]
struct ApiRequestContent<'a> {
    parts: Vec<ApiRequestPart<'a>>,
}

#[derive(Serialize)]
struct ApiRequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    response_modalities: [&'static str; 2],
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
}

#[derive(Deserialize)]
struct ApiContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<ApiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

/// Parse a successful response body into a [`GenerationResponse`].
pub(crate) fn parse_response(body: &str) -> Result<GenerationResponse, UpstreamError> {
    let api: ApiResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::malformed(format!("Invalid JSON response: {}", e)))?;

    let mut candidates = Vec::with_capacity(api.candidates.len());
    for candidate in api.candidates {
        let mut parts = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                let data = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                    UpstreamError::malformed(format!("Invalid base64 image data: {}", e))
                })?;
                parts.push(Part::InlineImage {
                    mime_type: inline.mime_type,
                    data,
                });
            } else if let Some(text) = part.text {
                parts.push(Part::Text(text));
            }
        }
        candidates.push(Candidate { parts });
    }

    Ok(GenerationResponse { candidates })
}

/// Classify a non-success HTTP status and its body.
pub(crate) fn classify_status(status: u16, body: &str) -> UpstreamError {
    let snippet: String = body.chars().take(200).collect();
    let lower = body.to_lowercase();

    // Status classes win over body text so a 5xx stays retryable whatever it says
    if status == 429 {
        UpstreamError::quota(format!("HTTP {}: {}", status, snippet))
    } else if (500..600).contains(&status) {
        UpstreamError::server(status, snippet)
    } else if lower.contains("resource_exhausted") || lower.contains("quota") {
        UpstreamError::quota(format!("HTTP {}: {}", status, snippet))
    } else if status == 401
        || status == 403
        || (lower.contains("api key") && (lower.contains("not valid") || lower.contains("invalid")))
    {
        UpstreamError::credentials(format!("HTTP {}: {}", status, snippet))
    } else {
        UpstreamError::unexpected(status, snippet)
    }
}

fn classify_transport(error: &reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::network(format!("Request timed out: {}", error))
    } else if error.is_connect() {
        UpstreamError::network(format!("Connection failed: {}", error))
    } else {
        UpstreamError::network(error.to_string())
    }
}

/// HTTPS client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// `PosterError::Config` when no usable API key is configured or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, PosterError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            PosterError::Config(
                "No generation API key configured (set generation.api_key or GEMINI_API_KEY)"
                    .to_string(),
            )
        })?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PosterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );

        Ok(Self { http, api_key, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ImageGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<GenerationResponse, UpstreamError> {
        let request = ApiRequest {
            contents: vec![ApiRequestContent {
                parts: vec![ApiRequestPart { text: prompt }],
            }],
            generation_config: ApiGenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response.text().map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        parse_response(&body)
    }
}
