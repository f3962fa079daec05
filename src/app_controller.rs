use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::{self, FileManager};
use crate::language_utils::{self, LanguagePair};
use crate::providers::{self, Provider};
use crate::translation::{CancellationFlag, ProgressSnapshot, TranslationPipeline, TranslationSummary};

// @module: Application controller for subtitle processing

// @const: Issues log written next to the translated files
pub const ISSUES_LOG_FILE: &str = "srtwai.issues.log";

/// Result of processing one input file
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Translation written to `output`
    Translated { output: PathBuf, summary: TranslationSummary },
    /// Output already existed and overwrite was not forced
    Skipped { output: PathBuf },
}

/// Counts reported after a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Provider shared by every file of a run
    provider: Arc<dyn Provider>,
    // @field: Set on Ctrl-C, checked before each batch starts
    cancel: CancellationFlag,
}

impl Controller {
    // @method: Create a controller with the provider selected by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let provider = providers::build_provider(&config.translation, config.pipeline.request_timeout())
            .context("Failed to create translation provider")?;
        Ok(Self::with_provider(config, provider))
    }

    // @method: Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that stops the run before the next batch starts
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Check that the provider is reachable
    pub async fn test_connection(&self) -> Result<()> {
        self.provider
            .test_connection()
            .await
            .with_context(|| format!("Cannot reach {}", self.provider.name()))
    }

    /// Translate a single SRT file into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite).await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<FileOutcome> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = file_utils::output_path(input_file, output_dir, &self.config.target_language);
        if output_path.exists() && !force_overwrite {
            warn!(
                "Skipping {}, translation already exists (use -f to force overwrite)",
                input_file.display()
            );
            return Ok(FileOutcome::Skipped { output: output_path });
        }
        FileManager::ensure_dir(output_dir)?;

        let languages = self.language_pair_for(input_file)?;
        let bytes = FileManager::read_bytes(input_file)?;

        info!(
            "SRTwAI: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let pipeline = TranslationPipeline::new(Arc::clone(&self.provider), self.config.pipeline.clone())
            .context("Invalid pipeline configuration")?;

        // Total is set once the document is parsed and split
        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=> "));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let pipeline = pipeline.with_progress_callback(Arc::new(move |snapshot: ProgressSnapshot| {
            pb.set_length(snapshot.total_batches as u64);
            pb.set_position(snapshot.completed_batches as u64);
        }));

        let output = pipeline
            .translate_srt(&bytes, &languages, &self.cancel)
            .await
            .with_context(|| format!("Failed to translate {}", input_file.display()));
        progress_bar.finish_and_clear();
        let output = output?;

        if output.summary.skipped_batches > 0 {
            return Err(anyhow!(
                "Translation of {} cancelled, {} batch(es) not started",
                input_file.display(),
                output.summary.skipped_batches
            ));
        }

        let failures: Vec<String> = output.result.failures().map(|failure| failure.to_string()).collect();
        if !failures.is_empty() {
            warn!(
                "{} batch(es) kept their original text, see {}",
                failures.len(),
                ISSUES_LOG_FILE
            );
            let header = format!(
                "{} - {} - {}",
                input_file.display(),
                self.config.translation.provider.display_name(),
                self.config.translation.get_model()
            );
            if let Err(e) = FileManager::append_to_log_file(output_dir.join(ISSUES_LOG_FILE), &header, &failures) {
                warn!("Failed to write issues log: {}", e);
            }
        }

        FileManager::write_to_file(&output_path, &output.srt)?;
        info!("Success: {}", output_path.display());
        info!(
            "Translation completed in {}.",
            Self::format_duration(output.summary.elapsed)
        );

        Ok(FileOutcome::Translated {
            output: output_path,
            summary: output.summary,
        })
    }

    /// Configured source language, or the one named in the input filename
    fn language_pair_for(&self, input_file: &Path) -> Result<LanguagePair> {
        let source = match &self.config.source_language {
            Some(source) => Some(source.clone()),
            None => file_utils::detect_language_from_filename(input_file).filter(|code| language_utils::is_supported(code)),
        };
        if let Some(code) = &source {
            debug!("Source language for {}: {}", input_file.display(), code);
        }
        LanguagePair::validated(source.as_deref(), &self.config.target_language)
            .with_context(|| format!("Invalid languages for {}", input_file.display()))
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Translate every SRT file below `input_dir`, writing next to each input
    /// Files that already are target-language subtitles are skipped
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target = &self.config.target_language;
        let (outputs, inputs): (Vec<PathBuf>, Vec<PathBuf>) = FileManager::find_srt_files(&input_dir)?
            .into_iter()
            .partition(|path| file_utils::is_translation_output(path, target));
        debug!("Ignoring {} file(s) already in the target language", outputs.len());

        if inputs.is_empty() {
            return Err(anyhow!("No subtitle files to translate in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(inputs.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("=> "));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for input_file in &inputs {
            if self.cancel.is_cancelled() {
                warn!("Folder run cancelled");
                break;
            }

            let file_name = input_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = input_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| input_dir.clone());

            match self.run_with_progress(input_file, &output_dir, &multi_progress, force_overwrite).await {
                Ok(FileOutcome::Translated { .. }) => summary.processed += 1,
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.errors
        );
        info!("{} in {}", message, Self::format_duration(start_time.elapsed()));

        if summary.errors > 0 {
            let header = format!("Folder: {}", input_dir.display());
            if let Err(e) = FileManager::append_to_log_file(input_dir.join(ISSUES_LOG_FILE), &header, &[message]) {
                warn!("Failed to write issues log: {}", e);
            }
        }

        Ok(summary)
    }
}
