//! Story writing and scene imagery.

mod image;
mod scene;
mod writer;

pub use image::{render_image, styled_prompt, ImageGenerator};
pub use scene::{AssetStatus, Scene, SceneDraft};
pub use writer::{parse_storyboard, storyboard_schema, StoryError, StoryWriter, DEFAULT_LANGUAGE};
