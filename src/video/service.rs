//! Collaborator capabilities consumed by the orchestrator.
//!
//! The orchestrator never talks HTTP itself. It drives a [`VideoJobService`]
//! (submit + poll), a [`PayloadFetcher`] (download by URI) and, through the
//! prompt reviser, a [`TextGenerator`]. `GeminiClient` implements all three;
//! tests plug in scripted fakes.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::gemini::GeminiError;

/// Mime type assumed when none can be inferred.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// One outstanding request to the video service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationJob {
    /// Opaque identifier assigned by the service.
    pub id: String,
    /// Set once the job reached a terminal state (success or error).
    pub done: bool,
    /// Download pointers for generated videos, in service order.
    pub video_uris: Vec<String>,
    /// Error message reported by the service, if any.
    pub error: Option<String>,
    /// Moderation reasons the service attached when it dropped results.
    pub filtered_reasons: Vec<String>,
}

impl GenerationJob {
    /// A freshly submitted job that has not completed yet.
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The first generated video reference, if present.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.video_uris
            .iter()
            .map(String::as_str)
            .find(|uri| !uri.trim().is_empty())
    }
}

/// An encoded still image used as the first frame of a generated clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read an image from disk, inferring the mime type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, std::io::Error> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, mime_from_extension(path)))
    }

    /// Decode a `data:<mime>;base64,<payload>` URL.
    ///
    /// Returns `None` when the URL is not a base64 data URL or the payload
    /// does not decode.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = BASE64.decode(payload.trim()).ok()?;
        let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
        Some(Self::new(bytes, mime))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Standard base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => DEFAULT_IMAGE_MIME,
    }
}

/// Raw result of a payload download.
///
/// A non-success status is a value here, not an error; transport failures
/// are reported through the `Err` side of [`PayloadFetcher::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchedPayload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous image-to-video job service.
#[async_trait]
pub trait VideoJobService: Send + Sync {
    /// Submit a new generation job for `image` animated per `prompt`.
    async fn submit(&self, image: &SourceImage, prompt: &str) -> Result<GenerationJob, GeminiError>;

    /// Re-fetch the state of a previously submitted job.
    async fn poll(&self, job: &GenerationJob) -> Result<GenerationJob, GeminiError>;
}

/// Download of a generated payload by its reference.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<FetchedPayload, GeminiError>;
}

/// Single request/response text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError>;

    /// Generate text constrained to JSON matching `schema`.
    ///
    /// Generators without structured output fall back to plain generation.
    async fn generate_json(
        &self,
        prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<String, GeminiError> {
        self.generate(prompt).await
    }
}

#[async_trait]
impl<T: VideoJobService + ?Sized> VideoJobService for Arc<T> {
    async fn submit(&self, image: &SourceImage, prompt: &str) -> Result<GenerationJob, GeminiError> {
        (**self).submit(image, prompt).await
    }

    async fn poll(&self, job: &GenerationJob) -> Result<GenerationJob, GeminiError> {
        (**self).poll(job).await
    }
}

#[async_trait]
impl<T: PayloadFetcher + ?Sized> PayloadFetcher for Arc<T> {
    async fn fetch(&self, uri: &str) -> Result<FetchedPayload, GeminiError> {
        (**self).fetch(uri).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        (**self).generate(prompt).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GeminiError> {
        (**self).generate_json(prompt, schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_job_has_no_result() {
        let job = GenerationJob::pending("op-1");
        assert_eq!(job.id, "op-1");
        assert!(!job.done);
        assert!(job.first_video_uri().is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_first_video_uri_skips_blank_entries() {
        let job = GenerationJob {
            id: "op".to_string(),
            done: true,
            video_uris: vec!["  ".to_string(), "https://v/1".to_string()],
            ..GenerationJob::default()
        };
        assert_eq!(job.first_video_uri(), Some("https://v/1"));
    }

    #[test]
    fn test_data_url_decodes_payload_and_mime() {
        let image = SourceImage::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.bytes(), b"hello");
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_data_url_rejects_non_base64() {
        assert!(SourceImage::from_data_url("data:image/png,hello").is_none());
        assert!(SourceImage::from_data_url("https://example.com/a.png").is_none());
        assert!(SourceImage::from_data_url("data:image/png;base64,***").is_none());
    }

    #[test]
    fn test_to_base64_round_trips_through_data_url() {
        let image = SourceImage::new(vec![0xff, 0xd8, 0xff], "image/jpeg");
        let url = format!("data:{};base64,{}", image.mime_type(), image.to_base64());
        assert_eq!(SourceImage::from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn test_from_path_infers_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("frame.PNG");
        std::fs::write(&png, b"png-bytes").unwrap();
        let image = SourceImage::from_path(&png).unwrap();
        assert_eq!(image.mime_type(), "image/png");

        let other = dir.path().join("frame.bin");
        std::fs::write(&other, b"raw").unwrap();
        assert_eq!(SourceImage::from_path(&other).unwrap().mime_type(), DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn test_fetched_payload_success_range() {
        assert!(FetchedPayload { status: 200, bytes: vec![] }.is_success());
        assert!(FetchedPayload { status: 206, bytes: vec![] }.is_success());
        assert!(!FetchedPayload { status: 302, bytes: vec![] }.is_success());
        assert!(!FetchedPayload { status: 404, bytes: vec![] }.is_success());
    }
}
