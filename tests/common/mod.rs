/*!
 * Common test utilities for the srtwai test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use srtwai::app_config::PipelineConfig;
use srtwai::language_utils::LanguagePair;
use srtwai::subtitle_processor::{SrtCodec, SubtitleDocument, Timestamp};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a sample subtitle file with three cues
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, &sample_srt(3))
}

/// SRT text with `count` cues: cue i runs from (i-1)*3s+1s for 2s and reads "Line i"
pub fn sample_srt(count: u32) -> String {
    let mut srt = String::new();
    for i in 1..=count {
        if i > 1 {
            srt.push('\n');
        }
        let start = Timestamp::from_millis(u64::from(i - 1) * 3_000 + 1_000);
        let end = Timestamp::from_millis(start.as_millis() + 2_000);
        srt.push_str(&format!("{}\n{} --> {}\nLine {}\n", i, start, end, i));
    }
    srt
}

/// Parsed document of `count` sample cues
pub fn sample_document(count: u32) -> SubtitleDocument {
    SrtCodec::parse(&sample_srt(count)).expect("sample SRT is valid")
}

/// English to French
pub fn en_to_fr() -> LanguagePair {
    LanguagePair::new(Some("en"), "fr")
}

/// Pipeline settings with millisecond delays so retry tests stay fast
pub fn fast_pipeline_config(batch_size: usize, concurrency: usize, max_retries: u32) -> PipelineConfig {
    PipelineConfig {
        max_entries_per_batch: batch_size,
        concurrency_limit: concurrency,
        max_retries,
        base_delay_secs: 0.01,
        max_delay_secs: 0.04,
        request_timeout_secs: 5,
        jitter_secs: 0.0,
    }
}

/// Route log output through the test harness
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
