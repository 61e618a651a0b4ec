//! Gemini (Google) image editing client.

use crate::error::{EditorError, Result};
use crate::image::provider::ImageEditor;
use crate::image::types::{EditMetadata, EditRequest, EditedImage, EncodedPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default Generative Language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key unless overridden.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// Finish reason reported for a normal completion.
const FINISH_STOP: &str = "STOP";

/// Gemini image model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for GeminiModel {
    fn from(name: &str) -> Self {
        match name {
            "gemini-2.5-flash-image" | "flash" => Self::FlashImage,
            "gemini-3-pro-image-preview" | "pro" => Self::ProImage,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    api_key_env: String,
    model: GeminiModel,
    base_url: String,
}

impl Default for GeminiEditorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key explicitly, bypassing the environment.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the environment variable read for the API key. Defaults to `API_KEY`.
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: impl Into<GeminiModel>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API root, e.g. for a proxy or a mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the editor.
    ///
    /// The credential is not resolved here; a missing key surfaces on the
    /// first [`ImageEditor::edit`] call.
    pub fn build(self) -> Result<GeminiEditor> {
        let client = reqwest::Client::builder().build()?;
        Ok(GeminiEditor {
            client,
            api_key: self.api_key,
            api_key_env: self.api_key_env,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

/// Gemini image editing client.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| read_env(&self.api_key_env))
            .ok_or_else(|| {
                EditorError::Configuration(format!(
                    "{} environment variable is not set.",
                    self.api_key_env
                ))
            })
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<EditedImage> {
        let api_key = self.resolve_api_key()?;

        if request.prompt.is_empty() {
            return Err(EditorError::InvalidRequest("prompt must not be empty".into()));
        }
        if request.image.data.is_empty() {
            return Err(EditorError::InvalidRequest("image data must not be empty".into()));
        }

        let start = Instant::now();
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );
        let body = GeminiRequest::for_edit(&request.image, &request.prompt);

        tracing::debug!(model = self.model.as_str(), "submitting Gemini edit request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EditorError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = interpret_response(gemini_response, self.model.as_str(), duration_ms);
        match &result {
            Ok(image) => {
                tracing::debug!(mime_type = %image.mime_type, duration_ms, "Gemini edit complete")
            }
            Err(e) => tracing::debug!(error = %e, "Gemini returned no image"),
        }
        result
    }
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
        self.edit_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Turns a successful response into an image or a typed failure.
///
/// Only the first candidate is considered, and within it the first part
/// carrying inline data wins.
fn interpret_response(
    response: GeminiResponse,
    model: &str,
    duration_ms: u64,
) -> Result<EditedImage> {
    let GeminiResponse {
        candidates,
        prompt_feedback,
    } = response;

    let candidate = candidates.into_iter().flatten().next();

    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let inline_data = candidate
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().flatten().find_map(|p| p.inline_data));

    if let Some(inline) = inline_data {
        return Ok(EditedImage::new(
            inline.mime_type,
            inline.data,
            EditMetadata {
                model: Some(model.to_string()),
                duration_ms: Some(duration_ms),
                finish_reason,
            },
        ));
    }

    match finish_reason {
        Some(reason) if reason != FINISH_STOP => Err(EditorError::GenerationRefused {
            finish_reason: reason,
            block_reason: prompt_feedback.and_then(|f| f.block_reason),
        }),
        _ => Err(EditorError::EmptyResponse),
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    /// Image first, then the instruction.
    fn for_edit(image: &EncodedPayload, prompt: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            },
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}
