// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use srtwai::app_config::{self, Config, TranslationProvider};
use srtwai::app_controller::Controller;
use srtwai::language_utils;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    OpenAI,
    Anthropic,
    Ollama,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate SRT subtitles using AI providers (default command)
    Translate(TranslateArgs),

    /// List supported language codes
    Languages,

    /// Generate shell completions for srtwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

#[derive(Args, Debug, Clone)]
struct TranslateOptions {
    /// Output directory (defaults to the input file's directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, env = "SRTWAI_MODEL")]
    model: Option<String>,

    /// Source language code, or 'auto' to let the provider detect it
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, env = "DEFAULT_TARGET_LANGUAGE")]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Maximum cues per request
    #[arg(long, env = "TRANSLATION_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Maximum requests in flight
    #[arg(long, env = "MAX_CONCURRENT_REQUESTS")]
    concurrency: Option<usize>,

    /// Retries per batch after the first attempt
    #[arg(long, env = "TRANSLATION_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Initial retry delay in seconds
    #[arg(long, env = "TRANSLATION_BASE_DELAY")]
    base_delay: Option<f64>,

    /// Retry delay cap in seconds
    #[arg(long, env = "TRANSLATION_MAX_DELAY")]
    max_delay: Option<f64>,
}

/// SRTwAI - SRT subtitle translation with AI
///
/// Translates SRT subtitle files in concurrent batches using various AI
/// providers (Gemini, OpenAI, Anthropic, Ollama, LM Studio).
#[derive(Parser, Debug)]
#[command(name = "srtwai")]
#[command(version)]
#[command(about = "AI-powered SRT subtitle translation tool")]
#[command(long_about = "SRTwAI translates SRT subtitle files with AI providers, keeping every timestamp intact.

EXAMPLES:
    srtwai movie.en.srt                          # Translate using default config
    srtwai -f movie.en.srt                       # Force overwrite existing files
    srtwai -p openai -m gpt-4o movie.en.srt      # Use specific provider and model
    srtwai -s en -t es movie.srt                 # Translate from English to Spanish
    srtwai --batch-size 50 --concurrency 2 movie.srt
    srtwai --log-level debug /subtitles/         # Process entire directory with debug logging
    srtwai languages                             # List supported languages
    srtwai completions bash > srtwai.bash        # Generate bash completions

CONFIGURATION:
    Configuration is read from --config, ./conf.json or the user config
    directory. If no config file exists, a default one is created.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default, requires GOOGLE_AI_API_KEY)
    openai    - OpenAI API (requires OPENAI_API_KEY)
    anthropic - Anthropic API (requires ANTHROPIC_API_KEY)
    ollama    - Local Ollama server (default: llama3.2:3b)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "srtwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Languages) => {
            print_languages();
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;
            run_translate(TranslateArgs {
                input_path,
                options: cli.options,
            })
            .await
        }
    }
}

fn print_languages() {
    println!("{:<6} {:<14} NATIVE", "CODE", "NAME");
    for (code, name) in language_utils::supported_languages() {
        let native = language_utils::get_native_name(code).unwrap_or_else(|| name.clone());
        println!("{:<6} {:<14} {}", code, name, native);
    }
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateOptions) -> Result<()> {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.set_model(model)?;
    }
    if let Some(source) = &options.source_language {
        let source = source.trim();
        config.source_language = if source.is_empty() || source.eq_ignore_ascii_case("auto") {
            None
        } else {
            Some(source.to_string())
        };
    }
    if let Some(target) = &options.target_language {
        config.target_language = target.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    let pipeline = &mut config.pipeline;
    if let Some(batch_size) = options.batch_size {
        pipeline.max_entries_per_batch = batch_size;
    }
    if let Some(concurrency) = options.concurrency {
        pipeline.concurrency_limit = concurrency;
    }
    if let Some(max_retries) = options.max_retries {
        pipeline.max_retries = max_retries;
    }
    if let Some(base_delay) = options.base_delay {
        pipeline.base_delay_secs = base_delay;
    }
    if let Some(max_delay) = options.max_delay {
        pipeline.max_delay_secs = max_delay;
    }
    Ok(())
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let options = &args.options;

    // Apply the command line level right away so config loading is logged with it
    if let Some(cli_level) = &options.log_level {
        let level: app_config::LogLevel = cli_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, config_path) = Config::load_or_create(options.config.as_deref())?;
    apply_overrides(&mut config, options)?;
    config
        .validate()
        .with_context(|| format!("Configuration validation failed ({})", config_path.display()))?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    let cancel = controller.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing batches in flight");
            cancel.cancel();
        }
    });

    let input_path = &args.input_path;
    if input_path.is_file() {
        let output_dir = options
            .output
            .clone()
            .unwrap_or_else(|| input_path.parent().unwrap_or(Path::new(".")).to_path_buf());
        controller
            .run(input_path.clone(), output_dir, options.force_overwrite)
            .await?;
    } else if input_path.is_dir() {
        if options.output.is_some() {
            info!("Folder mode writes each translation next to its input; --output is ignored");
        }
        let summary = controller
            .run_folder(input_path.clone(), options.force_overwrite)
            .await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} file(s) failed to translate", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}
