//! Scene model shared by the storyboard writer and the pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle of one generated asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AssetStatus::Idle => "idle",
            AssetStatus::Loading => "loading",
            AssetStatus::Success => "success",
            AssetStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// One scene as returned by the storyboard generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDraft {
    pub narration: String,
    pub image_prompt: String,
    pub animation_prompt: String,
}

/// A storyboard scene and the state of its generated assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: u32,
    pub narration: String,
    pub image_prompt: String,
    pub animation_prompt: String,
    pub image_status: AssetStatus,
    pub video_status: AssetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
    /// Animation prompt that actually produced the clip, after any rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_animation_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_error: Option<String>,
}

impl Scene {
    pub fn from_draft(id: u32, draft: SceneDraft) -> Self {
        Self {
            id,
            narration: draft.narration,
            image_prompt: draft.image_prompt,
            animation_prompt: draft.animation_prompt,
            image_status: AssetStatus::Idle,
            video_status: AssetStatus::Idle,
            image_path: None,
            video_path: None,
            final_animation_prompt: None,
            image_error: None,
            video_error: None,
        }
    }

    /// Number drafts from 1 in order.
    pub fn from_drafts(drafts: Vec<SceneDraft>) -> Vec<Self> {
        drafts
            .into_iter()
            .zip(1..)
            .map(|(draft, id)| Self::from_draft(id, draft))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(n: &str) -> SceneDraft {
        SceneDraft {
            narration: format!("narration {}", n),
            image_prompt: format!("image {}", n),
            animation_prompt: format!("pan {}", n),
        }
    }

    #[test]
    fn test_from_drafts_numbers_from_one() {
        let scenes = Scene::from_drafts(vec![draft("a"), draft("b"), draft("c")]);
        let ids: Vec<u32> = scenes.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(scenes
            .iter()
            .all(|s| s.image_status == AssetStatus::Idle && s.video_status == AssetStatus::Idle));
        assert_eq!(scenes[1].animation_prompt, "pan b");
    }

    #[test]
    fn test_draft_uses_camel_case_keys() {
        let json = r#"{"narration": "n", "imagePrompt": "i", "animationPrompt": "a"}"#;
        let parsed: SceneDraft = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.image_prompt, "i");
        assert_eq!(parsed.animation_prompt, "a");
    }

    #[test]
    fn test_scene_serialization_skips_empty_fields() {
        let scene = Scene::from_draft(1, draft("x"));
        let json = serde_json::to_string(&scene).unwrap();
        assert!(json.contains("\"imageStatus\":\"idle\""));
        assert!(!json.contains("videoPath"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AssetStatus::Loading.to_string(), "loading");
        assert_eq!(AssetStatus::default(), AssetStatus::Idle);
    }
}
