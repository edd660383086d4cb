//! Still image generation for storyboard scenes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::gemini::GeminiError;
use crate::video::SourceImage;

/// Text-to-image generation.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<SourceImage, GeminiError>;
}

#[async_trait]
impl<T: ImageGenerator + ?Sized> ImageGenerator for Arc<T> {
    async fn generate_image(&self, prompt: &str) -> Result<SourceImage, GeminiError> {
        (**self).generate_image(prompt).await
    }
}

/// Full image prompt for a scene prompt rendered in `style`.
pub fn styled_prompt(prompt: &str, style: &str) -> String {
    format!("{}, {}, 8k, high detail", prompt.trim(), style.trim())
}

/// Render a scene image in the given art style.
pub async fn render_image<G: ImageGenerator + ?Sized>(
    generator: &G,
    prompt: &str,
    style: &str,
) -> Result<SourceImage, GeminiError> {
    let full_prompt = styled_prompt(prompt, style);
    log::debug!("Rendering image: {}", full_prompt);
    generator.generate_image(&full_prompt).await
}
