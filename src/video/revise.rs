//! Automatic rewrite of animation instructions rejected by moderation.

use super::service::TextGenerator;

/// Build the meta-instruction sent to the text generator.
pub fn revision_prompt(instruction: &str) -> String {
    format!(
        "Rewrite the following animation prompt for AI video generation into a more \
         neutral, general, safe version suitable for all audiences. Remove any words \
         that could be considered sensitive, violent, offensive or inappropriate, and \
         focus on an objective description of the visuals. Reply with the rewritten \
         prompt only, without any explanation or preamble.\n\n\
         Original prompt: \"{}\"",
        instruction
    )
}

/// Rewrites instructions through a [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct PromptReviser<T> {
    generator: T,
}

impl<T: TextGenerator> PromptReviser<T> {
    pub fn new(generator: T) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &T {
        &self.generator
    }

    /// Return a safer rewrite of `instruction`.
    ///
    /// Never fails: if the generator errors or answers with nothing, the
    /// original instruction is returned unchanged.
    pub async fn revise(&self, instruction: &str) -> String {
        match self.generator.generate(&revision_prompt(instruction)).await {
            Ok(text) => {
                let revised = text.trim();
                if revised.is_empty() {
                    log::warn!("Prompt revision returned empty text; keeping original prompt");
                    return instruction.to_string();
                }
                log::info!("Revised prompt: \"{}\" -> \"{}\"", instruction, revised);
                revised.to_string()
            }
            Err(e) => {
                log::error!("Prompt revision failed: {}", e);
                instruction.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeminiError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<&'static str, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(GeminiError::InvalidResponse("boom".to_string())),
            }
        }
    }

    fn scripted(reply: Result<&'static str, ()>) -> Scripted {
        Scripted {
            reply,
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_revise_trims_generator_output() {
        let reviser = PromptReviser::new(scripted(Ok("  camera slowly pans right \n")));
        assert_eq!(reviser.revise("explosion tears the city").await, "camera slowly pans right");
    }

    #[tokio::test]
    async fn test_revise_embeds_original_instruction() {
        let reviser = PromptReviser::new(scripted(Ok("calm")));
        reviser.revise("storm over the battlefield").await;
        let prompts = reviser.generator().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"storm over the battlefield\""));
        assert!(prompts[0].contains("rewritten prompt only"));
    }

    #[tokio::test]
    async fn test_revise_falls_back_on_error() {
        let reviser = PromptReviser::new(scripted(Err(())));
        assert_eq!(reviser.revise("original text").await, "original text");
    }

    #[tokio::test]
    async fn test_revise_falls_back_on_blank_output() {
        let reviser = PromptReviser::new(scripted(Ok("   ")));
        assert_eq!(reviser.revise("original text").await, "original text");
    }
}
