//! Subcommand handlers.
//!
//! Each handler returns a user-facing error string; `main` prints it and
//! exits with status 1.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::config::{default_path as get_config_path, Config};
use crate::gemini::{GeminiClient, GeminiError, GEMINI_API_KEY_ENV};
use crate::pipeline::StoryboardPipeline;
use crate::story::{render_image, AssetStatus, Scene, StoryWriter};
use crate::video::{SourceImage, VideoOrchestrator, VideoStore};

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

/// Build the Gemini client, explaining how to provide a key when missing.
fn client(config: &Config) -> Result<GeminiClient, String> {
    GeminiClient::from_config(&config.gemini).map_err(|e| match e {
        GeminiError::MissingApiKey => format!(
            "{} is not set.\n\n\
            Add your API key to a .env file:\n    \
                echo '{}=your-api-key-here' >> .env\n\n\
            Or set it in the config file under [gemini] api_key.",
            GEMINI_API_KEY_ENV, GEMINI_API_KEY_ENV
        ),
        _ => format!("Failed to create Gemini client: {}", e),
    })
}

fn print_progress(message: &str) {
    println!("  {}", message);
}

/// Print a synopsis for `topic`.
pub fn run_synopsis(config: &Config, topic: &str) -> Result<(), String> {
    let writer = StoryWriter::new(client(config)?).with_language(&config.story.language);
    let synopsis = runtime()?
        .block_on(writer.synopsis(topic))
        .map_err(|e| e.to_string())?;
    println!("{}", synopsis);
    Ok(())
}

/// Print a full story expanded from `synopsis`.
pub fn run_story(config: &Config, synopsis: &str) -> Result<(), String> {
    let writer = StoryWriter::new(client(config)?).with_language(&config.story.language);
    let story = runtime()?
        .block_on(writer.full_story(synopsis))
        .map_err(|e| e.to_string())?;
    println!("{}", story);
    Ok(())
}

/// Print the scenes of the story in `story_file` as JSON.
pub fn run_storyboard(config: &Config, story_file: &Path) -> Result<(), String> {
    let story = std::fs::read_to_string(story_file)
        .map_err(|e| format!("Failed to read '{}': {}", story_file.display(), e))?;
    let writer = StoryWriter::new(client(config)?).with_language(&config.story.language);
    let scenes = runtime()?
        .block_on(writer.storyboard(&story))
        .map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&scenes)
        .map_err(|e| format!("Failed to serialize storyboard: {}", e))?;
    println!("{}", json);
    Ok(())
}

/// Generate one image and write it to `out`.
pub fn run_image(
    config: &Config,
    prompt: &str,
    style: Option<&str>,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let client = client(config)?;
    let style = style.unwrap_or(&config.story.style);

    println!("Generating image for: \"{}\"", prompt);
    let image = runtime()?
        .block_on(render_image(&client, prompt, style))
        .map_err(|e| format!("Image generation failed: {}", e))?;

    let path = out.unwrap_or_else(|| config.output.dir.join(format!("image.{}", image.extension())));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    std::fs::write(&path, image.bytes())
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    println!("Saved: {}", path.display());
    Ok(())
}

/// Animate the image at `image_path` and report where the clip was stored.
pub fn run_video(
    config: &Config,
    image_path: &Path,
    prompt: &str,
    out_dir: Option<PathBuf>,
) -> Result<(), String> {
    let image = SourceImage::from_path(image_path)
        .map_err(|e| format!("Failed to read image '{}': {}", image_path.display(), e))?;
    let client = client(config)?;
    let store = VideoStore::new(out_dir.unwrap_or_else(|| config.store_dir()));
    let orchestrator = VideoOrchestrator::new(client.clone(), client, store)
        .with_config(config.video.to_orchestrator_config());

    println!("Animating {} with: \"{}\"", image_path.display(), prompt);
    let result = runtime()?
        .block_on(orchestrator.produce_video(&image, prompt, &print_progress))
        .map_err(|e| e.to_string())?;

    println!();
    println!("Video: {}", result.handle.path().display());
    println!("Size: {} bytes", result.handle.size());
    if result.final_prompt != prompt {
        println!("Final prompt: \"{}\"", result.final_prompt);
    }
    Ok(())
}

/// Run the whole storyboard pipeline for `topic`.
pub fn run_pipeline(
    config: &Config,
    topic: &str,
    style: Option<&str>,
    out_dir: Option<PathBuf>,
) -> Result<(), String> {
    let output_dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
    let store = VideoStore::new(output_dir.join("videos"));
    let pipeline = StoryboardPipeline::new(client(config)?, store, output_dir)
        .with_language(&config.story.language)
        .with_style(style.unwrap_or(&config.story.style))
        .with_orchestrator_config(config.video.to_orchestrator_config());

    println!("Creating storyboard for: \"{}\"", topic);
    let report = runtime()?
        .block_on(pipeline.run(topic, &print_progress))
        .map_err(|e| e.to_string())?;

    println!();
    println!("Synopsis:\n{}\n", report.synopsis);
    for scene in &report.scenes {
        print_scene(scene);
    }
    println!(
        "{}/{} scene videos ready in {}",
        report.videos_ready(),
        report.scenes.len(),
        pipeline.output_dir().display()
    );
    Ok(())
}

fn print_scene(scene: &Scene) {
    println!("Scene {}: {}", scene.id, scene.narration);
    match (&scene.image_status, &scene.image_path) {
        (AssetStatus::Success, Some(path)) => println!("  image: {}", path.display()),
        _ => println!(
            "  image: {} {}",
            scene.image_status,
            scene.image_error.as_deref().unwrap_or("")
        ),
    }
    match (&scene.video_status, &scene.video_path) {
        (AssetStatus::Success, Some(path)) => {
            println!("  video: {}", path.display());
            if let Some(prompt) = &scene.final_animation_prompt {
                if prompt != &scene.animation_prompt {
                    println!("  final prompt: \"{}\"", prompt);
                }
            }
        }
        _ => println!(
            "  video: {} {}",
            scene.video_status,
            scene.video_error.as_deref().unwrap_or("")
        ),
    }
    println!();
}

/// Handle config subcommand actions.
pub fn handle_config_action(config_path: Option<&Path>, action: ConfigAction) -> Result<(), String> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(config_path.as_path())).map_err(|e| e.to_string())?;
            let rendered = config
                .to_toml()
                .map_err(|e| format!("Failed to render config: {}", e))?;

            println!("Current configuration:");
            println!();
            println!("{}", rendered);
            println!(
                "API key: {}",
                if config.gemini.api_key.is_some() { "set" } else { "not set" }
            );
            println!("Video store: {}", config.store_dir().display());
            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            Config::init(&config_path).map_err(|e| {
                format!("{}\nUse 'storyreel config show' to view current settings.", e)
            })?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
