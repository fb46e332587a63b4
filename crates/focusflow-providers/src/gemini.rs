use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::traits::{StudyAidProvider, StudyAidRequest};

pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER_NAME: &str = "gemini";

/// Study-aid generation backed by the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: normalize_base_url(base_url),
        }
    }

    /// Resolve the API key from `GEMINI_API_KEY`, falling back to an explicit
    /// key (e.g. from the credential store).
    pub fn with_resolved_key(
        stored_key: Option<String>,
        model: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or(stored_key.filter(|k| !k.is_empty()))
            .ok_or_else(|| ProviderError::MissingApiKey {
                provider: PROVIDER_NAME.to_string(),
            })?;
        Ok(Self::new(api_key, model, base_url))
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl StudyAidProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &StudyAidRequest) -> Result<String, ProviderError> {
        debug!(
            model = %self.model,
            kind = %request.kind,
            "sending Gemini generateContent request"
        );

        let body = GeminiGenerateContentRequest::from_study_aid_request(request);
        let http_response = self
            .client
            .post(self.generate_content_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| ProviderError::Transport {
                provider: PROVIDER_NAME.to_string(),
                message: error.to_string(),
            })?;

        if !http_response.status().is_success() {
            let status = http_response.status().as_u16();
            let body = match http_response.text().await {
                Ok(text) => text,
                Err(error) => format!("unable to read error body: {error}"),
            };
            return Err(ProviderError::HttpStatus {
                provider: PROVIDER_NAME.to_string(),
                status,
                message: extract_error_message(&body),
            });
        }

        let response: GeminiGenerateContentResponse =
            http_response
                .json()
                .await
                .map_err(|error| ProviderError::ResponseParse {
                    provider: PROVIDER_NAME.to_string(),
                    message: error.to_string(),
                })?;

        extract_text(response).ok_or_else(|| ProviderError::EmptyResponse {
            provider: PROVIDER_NAME.to_string(),
        })
    }
}

fn normalize_base_url(base_url: Option<String>) -> String {
    match base_url {
        Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
        _ => GEMINI_DEFAULT_BASE_URL.to_string(),
    }
}

fn extract_text(response: GeminiGenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let content = candidate.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pull the human-readable message out of a Gemini error envelope, falling
/// back to the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<GeminiErrorEnvelope>(body) {
        if let Some(message) = envelope.error.and_then(|e| e.message) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error detail provided".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiGenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

impl GeminiGenerateContentRequest {
    fn from_study_aid_request(request: &StudyAidRequest) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(build_prompt(request)),
                }],
            }],
            system_instruction: Some(GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(SYSTEM_INSTRUCTION.to_string()),
                }],
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    #[serde(default)]
    error: Option<GeminiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
}
