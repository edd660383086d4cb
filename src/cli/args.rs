//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turn a story idea into a narrated storyboard of generated images and clips
#[derive(Parser, Debug)]
#[command(name = "storyreel")]
#[command(version, about = "AI storyboard and video generator", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a short synopsis for a topic
    Synopsis {
        /// Story topic
        topic: String,
    },
    /// Expand a synopsis into a full story
    Story {
        /// Synopsis text
        synopsis: String,
    },
    /// Break a story file into scenes (printed as JSON)
    Storyboard {
        /// Text file containing the story
        story_file: PathBuf,
    },
    /// Generate a still image
    Image {
        /// Image prompt
        prompt: String,
        /// Art style (default from config)
        #[arg(long)]
        style: Option<String>,
        /// Output file (default: <output dir>/image.<ext>)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Animate an image into a video clip
    Video {
        /// First frame image
        #[arg(long, short)]
        image: PathBuf,
        /// Animation prompt
        #[arg(long, short)]
        prompt: String,
        /// Directory for the clip (default: video store dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Run the full pipeline: topic -> story -> scenes -> images -> videos
    Run {
        /// Story topic
        topic: String,
        /// Art style (default from config)
        #[arg(long)]
        style: Option<String>,
        /// Output directory (default from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
