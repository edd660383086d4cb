//! storyreel library crate.
//!
//! Story writing, scene imagery and image-to-video generation with automatic
//! prompt revision, backed by the Gemini API.

pub mod cli;
pub mod config;
pub mod gemini;
pub mod pipeline;
pub mod story;
pub mod video;
