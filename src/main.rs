use clap::Parser;
use tracing_subscriber::EnvFilter;

use storyreel::cli::{self, Args, Command};
use storyreel::config::Config;
use storyreel::gemini::GEMINI_API_KEY_ENV;

/// Load .env file, don't override existing env vars.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

/// Install the log subscriber. `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), String> {
    if let Command::Config { action } = args.command {
        return cli::handle_config_action(args.config.as_deref(), action);
    }

    let config = Config::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    if config.gemini.api_key.is_none() {
        log::warn!("{} is not set", GEMINI_API_KEY_ENV);
    }

    match args.command {
        Command::Synopsis { topic } => cli::run_synopsis(&config, &topic),
        Command::Story { synopsis } => cli::run_story(&config, &synopsis),
        Command::Storyboard { story_file } => cli::run_storyboard(&config, &story_file),
        Command::Image { prompt, style, out } => {
            cli::run_image(&config, &prompt, style.as_deref(), out)
        }
        Command::Video {
            image,
            prompt,
            out_dir,
        } => cli::run_video(&config, &image, &prompt, out_dir),
        Command::Run {
            topic,
            style,
            out_dir,
        } => cli::run_pipeline(&config, &topic, style.as_deref(), out_dir),
        Command::Config { .. } => Ok(()),
    }
}

fn main() {
    // Load .env file before anything else
    load_env();

    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_env_var_accessible_after_dotenv() {
        let _ = dotenv::dotenv();
        assert!(std::env::var("PATH").is_ok());
    }
}
