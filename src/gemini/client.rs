//! GeminiClient - handles communication with the Gemini REST API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ImageInstance, ImageParameters, ImagePredictRequest, ImagePredictResponse, InlineImage,
    Operation, OutputOptions, Part, VideoInstance, VideoParameters, VideoPredictRequest,
};
use crate::config::GeminiConfig;
use crate::video::{FetchedPayload, GenerationJob, SourceImage};

/// The environment variable name for the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default base URL for the Gemini API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for text generation and prompt revision.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default model for still images.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default model for image-to-video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Default timeout for API requests (120 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for video payload downloads (5 minutes).
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Header carrying the API key on API calls.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Validate a prompt before sending to the API.
pub fn validate_prompt(prompt: &str) -> Result<(), GeminiError> {
    if prompt.trim().is_empty() {
        return Err(GeminiError::EmptyPrompt);
    }
    Ok(())
}

/// Client for the Gemini text, image and video endpoints.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    video_model: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new GeminiClient with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, GeminiError> {
        Self::with_base_url(api_key, GEMINI_API_BASE_URL.to_string())
    }

    /// Create a new GeminiClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, GeminiError> {
        if api_key.is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            http_client,
        })
    }

    /// Build a client from the `[gemini]` configuration table.
    ///
    /// The key from the configuration wins when present, otherwise the
    /// environment is consulted.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => std::env::var(GEMINI_API_KEY_ENV).map_err(|_| GeminiError::MissingApiKey)?,
        };
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string());
        let mut client = Self::with_base_url(api_key, base_url)?;
        client.text_model = config.text_model.clone();
        client.image_model = config.image_model.clone();
        client.video_model = config.video_model.clone();
        Ok(client)
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = model.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    pub fn video_model(&self) -> &str {
        &self.video_model
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    /// Send a prompt to `generateContent` and return the response text.
    ///
    /// When `json_schema` is given the request asks for
    /// `application/json` output constrained by that schema.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::EmptyPrompt` for blank prompts,
    /// `GeminiError::ApiError` for non-success responses,
    /// `GeminiError::InvalidResponse` if the response carries no text
    /// (for example when the prompt itself was blocked), or
    /// `GeminiError::HttpError` if the request fails.
    pub async fn generate_content(
        &self,
        prompt: &str,
        json_schema: Option<&serde_json::Value>,
    ) -> Result<String, GeminiError> {
        validate_prompt(prompt)?;

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: json_schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(schema.clone()),
            }),
        };

        let response = self
            .http_client
            .post(self.model_url(&self.text_model, "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: GenerateContentResponse = response.json().await?;
        match body.text() {
            Some(text) => Ok(text),
            None => {
                let reason = body
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .or_else(|| body.candidates.first().and_then(|c| c.finish_reason.clone()))
                    .unwrap_or_else(|| "no candidates".to_string());
                log::warn!("Text generation returned no text ({})", reason);
                Err(GeminiError::InvalidResponse(format!(
                    "response contained no text ({})",
                    reason
                )))
            }
        }
    }

    /// Generate one 16:9 JPEG image for `prompt`.
    pub async fn generate_image(&self, prompt: &str) -> Result<SourceImage, GeminiError> {
        validate_prompt(prompt)?;

        let request_body = ImagePredictRequest {
            instances: vec![ImageInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                aspect_ratio: "16:9".to_string(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };

        let response = self
            .http_client
            .post(self.model_url(&self.image_model, "predict"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: ImagePredictResponse = response.json().await?;
        let prediction = body.predictions.into_iter().next().ok_or_else(|| {
            GeminiError::InvalidResponse("image response contained no predictions".to_string())
        })?;
        let bytes = BASE64.decode(prediction.bytes_base64_encoded.as_bytes())?;
        let mime = prediction
            .mime_type
            .unwrap_or_else(|| "image/jpeg".to_string());
        Ok(SourceImage::new(bytes, mime))
    }

    /// Submit an image-to-video job to the long-running video endpoint.
    ///
    /// Returns the job as reported by the service; its id is the operation
    /// name used for polling.
    pub async fn submit_video(
        &self,
        image: &SourceImage,
        prompt: &str,
    ) -> Result<GenerationJob, GeminiError> {
        validate_prompt(prompt)?;

        let request_body = VideoPredictRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: InlineImage {
                    bytes_base64_encoded: image.to_base64(),
                    mime_type: Some(image.mime_type().to_string()),
                },
            }],
            parameters: VideoParameters { sample_count: 1 },
        };

        let response = self
            .http_client
            .post(self.model_url(&self.video_model, "predictLongRunning"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let operation: Operation = response.json().await?;
        log::debug!("Video operation created: {}", operation.name);
        Ok(operation_to_job(operation))
    }

    /// Fetch the current state of a video operation by name.
    pub async fn get_operation(&self, name: &str) -> Result<GenerationJob, GeminiError> {
        let url = format!("{}/v1beta/{}", self.base_url, name.trim_start_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let operation: Operation = response.json().await?;
        Ok(operation_to_job(operation))
    }

    /// Download a generated video.
    ///
    /// The API key is appended as a `key` query parameter, which the file
    /// download endpoint requires. Transport errors have their URL stripped
    /// so the key never reaches an error message. A non-success status is
    /// returned as part of the payload rather than as an error.
    pub async fn download(&self, uri: &str) -> Result<FetchedPayload, GeminiError> {
        let url = with_key_param(uri, &self.api_key);

        let response = self
            .http_client
            .get(&url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| GeminiError::HttpError(e.without_url()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            log::warn!("Video download returned HTTP {}", status);
            return Ok(FetchedPayload {
                status,
                bytes: Vec::new(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GeminiError::HttpError(e.without_url()))?;
        Ok(FetchedPayload {
            status,
            bytes: bytes.to_vec(),
        })
    }
}

/// Append `key=<api key>` to a download URI.
fn with_key_param(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", uri, separator, api_key)
}

fn operation_to_job(operation: Operation) -> GenerationJob {
    let (video_uris, filtered_reasons) = match operation
        .response
        .and_then(|r| r.generate_video_response)
    {
        Some(videos) => (
            videos
                .generated_samples
                .into_iter()
                .filter_map(|s| s.video.and_then(|v| v.uri))
                .collect(),
            videos.rai_media_filtered_reasons,
        ),
        None => (Vec::new(), Vec::new()),
    };

    let error = operation.error.map(|e| match e.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => match e.code {
            Some(code) => format!("unknown API error (code {})", code),
            None => "unknown API error".to_string(),
        },
    });

    GenerationJob {
        id: operation.name,
        done: operation.done,
        video_uris,
        error,
        filtered_reasons,
    }
}

/// Build an `ApiError` from a non-success response, preferring the message
/// inside the Google error envelope over the raw body.
async fn api_error(response: reqwest::Response) -> GeminiError {
    let status = response.status().as_u16();
    let raw = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = match serde_json::from_str::<ErrorEnvelope>(&raw) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => raw,
    };
    GeminiError::ApiError { status, message }
}

/// Errors that can occur during Gemini operations.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status returned by the API
        status: u16,
        /// Message from the error envelope, or the raw body
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to decode payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Empty prompt")]
    EmptyPrompt,
}
