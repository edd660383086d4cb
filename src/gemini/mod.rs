//! Gemini API integration.
//!
//! A thin HTTP client for the text (`generateContent`), image (`predict`) and
//! long-running video (`predictLongRunning` + operation polling) endpoints,
//! plus the collaborator trait implementations the orchestrator and the story
//! writer consume.

mod client;
mod services;
mod types;

pub use client::{
    validate_prompt, GeminiClient, GeminiError, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
    DEFAULT_VIDEO_MODEL, GEMINI_API_BASE_URL, GEMINI_API_KEY_ENV,
};
