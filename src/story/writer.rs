//! StoryWriter - synopsis, full story and storyboard generation.

use serde_json::json;

use super::scene::{Scene, SceneDraft};
use crate::gemini::GeminiError;
use crate::video::TextGenerator;

/// Language used when none is configured.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Writes stories and storyboards through a [`TextGenerator`].
pub struct StoryWriter<T> {
    generator: T,
    language: String,
}

impl<T: TextGenerator> StoryWriter<T> {
    pub fn new(generator: T) -> Self {
        Self {
            generator,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Draft a synopsis of about 100 words for `topic`.
    pub async fn synopsis(&self, topic: &str) -> Result<String, StoryError> {
        let topic = non_empty(topic, "topic")?;
        let prompt = format!(
            "Based on this topic: \"{}\", write a story synopsis of about 100 words in {}.",
            topic, self.language
        );
        let text = self.generator.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }

    /// Expand a synopsis into a complete story of about 500 words.
    pub async fn full_story(&self, synopsis: &str) -> Result<String, StoryError> {
        let synopsis = non_empty(synopsis, "synopsis")?;
        let prompt = format!(
            "Expand the following synopsis into a complete story of about 500 words in {}.\n\nSynopsis:\n{}",
            self.language, synopsis
        );
        let text = self.generator.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }

    /// Break a story into numbered scenes.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Storyboard` when the generated text is not a
    /// JSON array of scenes, and `StoryError::EmptyStoryboard` when the
    /// array is empty.
    pub async fn storyboard(&self, story: &str) -> Result<Vec<Scene>, StoryError> {
        let story = non_empty(story, "story")?;
        let prompt = storyboard_prompt(story, &self.language);
        let text = self.generator.generate_json(&prompt, &storyboard_schema()).await?;
        let drafts = parse_storyboard(&text)?;
        log::info!("Storyboard generated with {} scenes", drafts.len());
        Ok(Scene::from_drafts(drafts))
    }
}

fn non_empty<'a>(input: &'a str, what: &'static str) -> Result<&'a str, StoryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StoryError::EmptyInput(what));
    }
    Ok(trimmed)
}

fn storyboard_prompt(story: &str, language: &str) -> String {
    format!(
        "You are a professional storyboard writer for short videos. Break the following story into a series of separate scenes. Every scene must contain:\n\
1. 'narration': a narration of 60 to 80 words in {language}.\n\
2. 'imagePrompt': a detailed visual description for an AI image generator, in an epic cinematic style.\n\
3. 'animationPrompt': a short description of the camera motion or animation, for example 'slow zoom in', 'pan from left to right', 'the water surface shimmers'.\n\
\n\
Story:\n\
---\n\
{story}\n\
---\n\
\n\
Output valid JSON: an array of scene objects."
    )
}

/// Response schema for structured storyboard output.
pub fn storyboard_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "narration": { "type": "STRING", "description": "Narration text for the scene" },
                "imagePrompt": { "type": "STRING", "description": "Prompt for generating the scene image" },
                "animationPrompt": { "type": "STRING", "description": "Animation prompt for generating the scene video" }
            },
            "required": ["narration", "imagePrompt", "animationPrompt"]
        }
    })
}

/// Parse a storyboard JSON array, tolerating a surrounding markdown fence.
pub fn parse_storyboard(text: &str) -> Result<Vec<SceneDraft>, StoryError> {
    let body = strip_code_fence(text.trim());
    let drafts: Vec<SceneDraft> =
        serde_json::from_str(body).map_err(|e| StoryError::Storyboard(e.to_string()))?;
    if drafts.is_empty() {
        return Err(StoryError::EmptyStoryboard);
    }
    Ok(drafts)
}

fn strip_code_fence(text: &str) -> &str {
    match text.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => text,
    }
}

/// Errors from story and storyboard generation.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("The {0} must not be empty")]
    EmptyInput(&'static str),

    #[error("Text generation failed: {0}")]
    Generation(#[from] GeminiError),

    #[error("Could not parse the generated storyboard, please try again: {0}")]
    Storyboard(String),

    #[error("The generated storyboard contains no scenes")]
    EmptyStoryboard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
        json_calls: Mutex<u32>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
                json_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        async fn generate_json(
            &self,
            prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<String, GeminiError> {
            *self.json_calls.lock().unwrap() += 1;
            self.generate(prompt).await
        }
    }

    #[tokio::test]
    async fn test_synopsis_includes_topic_and_language() {
        let writer = StoryWriter::new(Canned::new("  A short tale.  ")).with_language("French");
        assert_eq!(writer.language(), "French");
        let synopsis = writer.synopsis("a lost robot").await.unwrap();
        assert_eq!(synopsis, "A short tale.");

        let prompts = writer.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("\"a lost robot\""));
        assert!(prompts[0].contains("about 100 words in French"));
    }

    #[tokio::test]
    async fn test_full_story_embeds_synopsis() {
        let writer = StoryWriter::new(Canned::new("Once upon a time"));
        assert_eq!(writer.language(), DEFAULT_LANGUAGE);
        writer.full_story("Robot finds home").await.unwrap();
        let prompts = writer.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("about 500 words in English"));
        assert!(prompts[0].ends_with("Synopsis:\nRobot finds home"));
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected_without_calling_generator() {
        let writer = StoryWriter::new(Canned::new("unused"));
        let err = writer.synopsis("   ").await.unwrap_err();
        assert!(matches!(err, StoryError::EmptyInput("topic")));
        assert!(writer.generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storyboard_uses_structured_output() {
        let reply = r#"[
            {"narration": "Dawn breaks.", "imagePrompt": "sunrise over hills", "animationPrompt": "slow zoom in"},
            {"narration": "Night falls.", "imagePrompt": "starry sky", "animationPrompt": "pan left"}
        ]"#;
        let writer = StoryWriter::new(Canned::new(reply));
        let scenes = writer.storyboard("A day passes.").await.unwrap();

        assert_eq!(*writer.generator.json_calls.lock().unwrap(), 1);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].id, 1);
        assert_eq!(scenes[1].image_prompt, "starry sky");
    }

    #[tokio::test]
    async fn test_storyboard_invalid_json() {
        let writer = StoryWriter::new(Canned::new("Sorry, I cannot do that."));
        let err = writer.storyboard("story").await.unwrap_err();
        assert!(matches!(err, StoryError::Storyboard(_)));
    }

    #[test]
    fn test_parse_storyboard_strips_fence() {
        let text = "```json\n[{\"narration\": \"n\", \"imagePrompt\": \"i\", \"animationPrompt\": \"a\"}]\n```";
        let drafts = parse_storyboard(text).unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_parse_storyboard_rejects_missing_fields_and_empty() {
        assert!(matches!(
            parse_storyboard(r#"[{"narration": "n"}]"#),
            Err(StoryError::Storyboard(_))
        ));
        assert!(matches!(parse_storyboard("[]"), Err(StoryError::EmptyStoryboard)));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = storyboard_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["required"].as_array().unwrap().len(), 3);
    }
}
