//! Storyboard pipeline for storyreel.
//!
//! Turns a topic into a synopsis, a story and a list of scenes, then renders
//! every scene's image and video concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::story::{render_image, AssetStatus, ImageGenerator, Scene, StoryError, StoryWriter};
use crate::video::{
    OrchestratorConfig, PayloadFetcher, PrefixedProgress, ProgressSink, TextGenerator,
    VideoJobService, VideoOrchestrator, VideoStore,
};

/// Errors that abort a whole pipeline run.
///
/// Per-scene failures do not abort the run; they are recorded on the scene.
#[derive(Debug)]
pub enum PipelineError {
    /// Synopsis, story or storyboard generation failed
    Story(StoryError),
    /// The output directory could not be created
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Story(e) => write!(f, "{}", e),
            PipelineError::OutputDir { path, source } => {
                write!(
                    f,
                    "Failed to create output directory '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Story(e) => Some(e),
            PipelineError::OutputDir { source, .. } => Some(source),
        }
    }
}

impl From<StoryError> for PipelineError {
    fn from(e: StoryError) -> Self {
        PipelineError::Story(e)
    }
}

/// Everything produced by one run.
#[derive(Debug, Clone, Serialize)]
pub struct StoryboardReport {
    pub topic: String,
    pub synopsis: String,
    pub story: String,
    pub scenes: Vec<Scene>,
}

impl StoryboardReport {
    /// Number of scenes whose clip was generated.
    pub fn videos_ready(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.video_status == AssetStatus::Success)
            .count()
    }
}

/// Runs topic -> scenes -> images -> videos against one backend.
///
/// The backend `C` provides text, image and video generation; the Gemini
/// client implements all of them.
pub struct StoryboardPipeline<C> {
    writer: StoryWriter<Arc<C>>,
    images: Arc<C>,
    orchestrator: VideoOrchestrator<Arc<C>, Arc<C>>,
    style: String,
    output_dir: PathBuf,
}

impl<C> StoryboardPipeline<C>
where
    C: TextGenerator + ImageGenerator + VideoJobService + PayloadFetcher,
{
    /// Create a pipeline writing images into `output_dir` and clips into `store`.
    pub fn new(backend: C, store: VideoStore, output_dir: PathBuf) -> Self {
        let backend = Arc::new(backend);
        Self {
            writer: StoryWriter::new(Arc::clone(&backend)),
            images: Arc::clone(&backend),
            orchestrator: VideoOrchestrator::new(Arc::clone(&backend), backend, store),
            style: crate::config::StoryConfig::default().style,
            output_dir,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.writer = self.writer.with_language(language);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_orchestrator_config(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = self.orchestrator.with_config(config);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole pipeline for `topic`.
    pub async fn run(
        &self,
        topic: &str,
        progress: &dyn ProgressSink,
    ) -> Result<StoryboardReport, PipelineError> {
        progress.notify("Writing synopsis...");
        let synopsis = self.writer.synopsis(topic).await?;

        progress.notify("Writing story...");
        let story = self.writer.full_story(&synopsis).await?;

        progress.notify("Building storyboard...");
        let scenes = self.writer.storyboard(&story).await?;
        progress.notify(&format!("Storyboard ready with {} scenes", scenes.len()));

        let scenes = self.render_scenes(scenes, progress).await?;

        Ok(StoryboardReport {
            topic: topic.trim().to_string(),
            synopsis,
            story,
            scenes,
        })
    }

    /// Render images and videos for `scenes` concurrently.
    ///
    /// Returns the scenes in input order with their asset state filled in.
    pub async fn render_scenes(
        &self,
        scenes: Vec<Scene>,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<Scene>, PipelineError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PipelineError::OutputDir {
                path: self.output_dir.clone(),
                source: e,
            })?;

        Ok(join_all(
            scenes
                .into_iter()
                .map(|scene| self.render_scene(scene, progress)),
        )
        .await)
    }

    async fn render_scene(&self, mut scene: Scene, progress: &dyn ProgressSink) -> Scene {
        let sink = PrefixedProgress::new(format!("[Scene {}] ", scene.id), progress);

        scene.image_status = AssetStatus::Loading;
        sink.notify("Generating image...");
        let image = match render_image(&*self.images, &scene.image_prompt, &self.style).await {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Scene {} image failed: {}", scene.id, e);
                scene.image_status = AssetStatus::Error;
                scene.image_error = Some(e.to_string());
                sink.notify("Image generation failed");
                return scene;
            }
        };

        let image_path = self
            .output_dir
            .join(format!("scene-{:02}.{}", scene.id, image.extension()));
        if let Err(e) = tokio::fs::write(&image_path, image.bytes()).await {
            log::warn!("Scene {} image could not be saved: {}", scene.id, e);
            scene.image_status = AssetStatus::Error;
            scene.image_error = Some(format!("Failed to save image: {}", e));
            return scene;
        }
        scene.image_status = AssetStatus::Success;
        scene.image_path = Some(image_path);

        scene.video_status = AssetStatus::Loading;
        match self
            .orchestrator
            .produce_video(&image, &scene.animation_prompt, &sink)
            .await
        {
            Ok(result) => {
                scene.video_status = AssetStatus::Success;
                scene.video_path = Some(result.handle.path().to_path_buf());
                scene.final_animation_prompt = Some(result.final_prompt);
            }
            Err(e) => {
                log::warn!("Scene {} video failed: {}", scene.id, e);
                scene.video_status = AssetStatus::Error;
                scene.video_error = Some(e.to_string());
                sink.notify(&format!("Video generation failed: {}", e));
            }
        }

        scene
    }
}
