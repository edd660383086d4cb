//! Collaborator trait implementations backed by [`GeminiClient`].

use async_trait::async_trait;

use super::client::{GeminiClient, GeminiError};
use crate::story::ImageGenerator;
use crate::video::{
    FetchedPayload, GenerationJob, PayloadFetcher, SourceImage, TextGenerator, VideoJobService,
};

#[async_trait]
impl VideoJobService for GeminiClient {
    async fn submit(&self, image: &SourceImage, prompt: &str) -> Result<GenerationJob, GeminiError> {
        self.submit_video(image, prompt).await
    }

    async fn poll(&self, job: &GenerationJob) -> Result<GenerationJob, GeminiError> {
        self.get_operation(&job.id).await
    }
}

#[async_trait]
impl PayloadFetcher for GeminiClient {
    async fn fetch(&self, uri: &str) -> Result<FetchedPayload, GeminiError> {
        self.download(uri).await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate_content(prompt, None).await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GeminiError> {
        self.generate_content(prompt, Some(schema)).await
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> Result<SourceImage, GeminiError> {
        GeminiClient::generate_image(self, prompt).await
    }
}
