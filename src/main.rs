// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod classifier;
mod container;
mod errors;
mod file_utils;
mod fingerprint;
mod prompt;
mod store;
mod subtitle_processor;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean media and subtitle files (default command)
    #[command(alias = "clean")]
    Clean(CleanArgs),

    /// Generate shell completions for subsweep
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CleanArgs {
    /// Files or directories to clean
    #[arg(value_name = "INPUT_PATHS", required = true)]
    input_paths: Vec<PathBuf>,

    /// Configuration file path (defaults to ~/.subsweep.json)
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subsweep - media and subtitle sanitizer
///
/// Strips embedded subtitle tracks and unwanted metadata from media
/// containers, and removes unwanted cues from subtitle documents, remembering
/// every keep/delete decision by content hash so the same text is never
/// reviewed twice.
#[derive(Parser, Debug)]
#[command(name = "subsweep")]
#[command(version)]
#[command(about = "Strips unwanted subtitle cues, tracks and metadata from media files")]
#[command(long_about = "subsweep cleans media containers and subtitle documents.

EXAMPLES:
    subsweep movie.mkv                    # Remove embedded subs and title metadata
    subsweep movie.srt episode.vtt        # Review flagged cues, remembering answers
    subsweep /media/library/              # Clean every supported file under a directory
    subsweep --log-level debug movie.mkv  # Verbose run
    subsweep completions bash             # Generate bash completions

CONFIGURATION:
    The store connection lives in ~/.subsweep.json. On first run the file is
    created with template credentials and the program exits; edit it before
    running again.

EXTERNAL TOOLS:
    ffmpeg, mkvpropedit and mediainfo must be on PATH for container cleaning.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Files or directories to clean
    #[arg(value_name = "INPUT_PATHS")]
    input_paths: Vec<PathBuf>,

    /// Configuration file path (defaults to ~/.subsweep.json)
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subsweep", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Clean(args)) => run_clean(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            if cli.input_paths.is_empty() {
                return Err(anyhow!(
                    "INPUT_PATHS is required when no subcommand is specified"
                ));
            }

            run_clean(CleanArgs {
                input_paths: cli.input_paths,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
            .await
        }
    }
}

async fn run_clean(options: CleanArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(Config::default_path);

    // Missing configuration is the only hard stop, and it happens here,
    // before any input file is touched
    if !config_path.exists() {
        let template = Config::default();
        template
            .save_to_file(&config_path)
            .context("Failed to write template config")?;

        warn!(
            "Created config file at: {}. Fill in the store endpoint before running again.",
            config_path.display()
        );
        return Ok(());
    }

    // from_file validates the loaded configuration
    let mut config = Config::from_file(&config_path)?;

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    let mut controller = Controller::with_config(config).await?;

    for input in &options.input_paths {
        let summary = controller.run(input).await?;
        if summary.failed > 0 {
            warn!(
                "{} file(s) under {} were left in their last safe state",
                summary.failed,
                input.display()
            );
        }
    }

    info!("All inputs processed");
    Ok(())
}
