//! Configuration file handling for storyreel.
//!
//! Loads configuration from `<config dir>/storyreel/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::gemini::{
    DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_VIDEO_MODEL, GEMINI_API_KEY_ENV,
};
use crate::video::{
    OrchestratorConfig, DEFAULT_GENERATION_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};

/// Configuration file structure for storyreel.
/// Loaded from <config dir>/storyreel/config.toml (or custom path via --config).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub story: StoryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GeminiConfig {
    /// Overridden by `GEMINI_API_KEY` when that is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_video_model")]
    pub video_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VideoConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where generated clips are written. Defaults to the user cache dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            store_dir: None,
        }
    }
}

impl VideoConfig {
    /// Orchestrator parameters for these settings. `max_attempts` is at least 1.
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_attempts: self.max_attempts.max(1),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StoryConfig {
    /// Language the synopsis, story and narration are written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Art style appended to image prompts when none is given.
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            style: default_style(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_GENERATION_TIMEOUT.as_secs()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_style() -> String {
    "cinematic digital painting".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("storyreel-output")
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    ///
    /// `GEMINI_API_KEY` from the environment replaces any key in the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV) {
            if !key.is_empty() {
                config.gemini.api_key = Some(key);
            }
        }
        Ok(config)
    }

    /// Load only the file, without consulting the environment.
    pub fn load_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Render as TOML. The API key is never written out.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut redacted = self.clone();
        redacted.gemini.api_key = None;
        toml::to_string_pretty(&redacted)
    }

    /// Write the default configuration to `path`, creating parent directories.
    ///
    /// Refuses to overwrite an existing file.
    pub fn init(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = Config::default()
            .to_toml()
            .map_err(|e| ConfigError::SerializeError { source: e })?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Clip store directory: configured value or the user cache default.
    pub fn store_dir(&self) -> PathBuf {
        self.video
            .store_dir
            .clone()
            .unwrap_or_else(crate::video::default_store_dir)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    SerializeError {
        source: toml::ser::Error,
    },
    AlreadyExists {
        path: PathBuf,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::SerializeError { source } => {
                write!(f, "Failed to serialize config: {}", source)
            }
            ConfigError::AlreadyExists { path } => {
                write!(f, "Config file '{}' already exists", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::SerializeError { source } => Some(source),
            ConfigError::AlreadyExists { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("storyreel").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/storyreel/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_file(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_video_defaults() {
        let config = Config::default();
        let orchestrator = config.video.to_orchestrator_config();
        assert_eq!(orchestrator.max_attempts, 3);
        assert_eq!(orchestrator.poll_interval, Duration::from_secs(15));
        assert_eq!(orchestrator.timeout, Duration::from_secs(300));
        assert_eq!(orchestrator, OrchestratorConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[video]
max_attempts = 5

[story]
language = "Traditional Chinese"
"#,
        )
        .unwrap();

        let config = Config::load_file(Some(&path)).unwrap();
        assert_eq!(config.video.max_attempts, 5);
        assert_eq!(config.video.poll_interval_secs, 15);
        assert_eq!(config.story.language, "Traditional Chinese");
        assert_eq!(config.story.style, "cinematic digital painting");
        assert_eq!(config.gemini.video_model, DEFAULT_VIDEO_MODEL);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let video = VideoConfig {
            max_attempts: 0,
            ..VideoConfig::default()
        };
        assert_eq!(video.to_orchestrator_config().max_attempts, 1);
    }

    #[test]
    fn test_parse_error_mentions_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[video\nmax_attempts = ").unwrap();

        let err = Config::load_file(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_to_toml_omits_api_key() {
        let mut config = Config::default();
        config.gemini.api_key = Some("secret".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("max_attempts = 3"));
    }

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::init(&path).unwrap();
        assert_eq!(Config::load_file(Some(&path)).unwrap(), Config::default());

        let err = Config::init(&path).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    }

    #[test]
    fn test_store_dir_override() {
        let mut config = Config::default();
        config.video.store_dir = Some(PathBuf::from("/tmp/clips"));
        assert_eq!(config.store_dir(), PathBuf::from("/tmp/clips"));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = default_path();
        assert!(path.ends_with("storyreel/config.toml"));
    }
}
