use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::language_utils;

// @module: File and directory utilities

// @const: Subtitle file extension
pub const SRT_EXTENSION: &str = "srt";

// @const: Filename parts that qualify a subtitle track rather than name it
const MODIFIERS: [&str; 5] = ["sdh", "forced", "cc", "hi", "default"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find SRT files below a directory, sorted by path
    pub fn find_srt_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && has_srt_extension(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file as raw bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Append lines to a log file under a timestamped header
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, header: &str, lines: &[String]) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        let mut content = format!("[{}] {}\n", timestamp, header);
        for line in lines {
            content.push_str("  ");
            content.push_str(line);
            content.push('\n');
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))
    }
}

fn has_srt_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SRT_EXTENSION))
        .unwrap_or(false)
}

/// Parts of a subtitle filename of the form `name[.track].lang[.modifier].srt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFileName {
    pub base: String,
    pub track: Option<String>,
    /// ISO 639-1 code when the filename carries a recognizable language
    pub language: Option<String>,
    pub modifier: Option<String>,
}

impl SubtitleFileName {
    pub fn parse(file_name: &str) -> Self {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(SRT_EXTENSION) => stem,
            _ => file_name,
        };
        let parts: Vec<&str> = stem.split('.').collect();
        let mut end = parts.len();

        let mut has_modifier = end > 1 && MODIFIERS.contains(&parts[end - 1].to_lowercase().as_str());
        let mut language_end = if has_modifier { end - 1 } else { end };
        let mut language = if language_end > 1 {
            language_utils::to_part1(parts[language_end - 1])
        } else {
            None
        };

        // "hi" is both a modifier and a language code
        if language.is_none() && has_modifier {
            language = language_utils::to_part1(parts[end - 1]);
            if language.is_some() {
                has_modifier = false;
                language_end = end;
            }
        }

        // A modifier without a language stays part of the name
        let mut modifier = None;
        let mut track = None;
        if language.is_some() {
            if has_modifier {
                modifier = Some(parts[end - 1].to_lowercase());
            }
            end = language_end - 1;
            let last = parts[end - 1];
            if end > 1 && !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
                track = Some(last.to_string());
                end -= 1;
            }
        }

        Self {
            base: parts[..end].join("."),
            track,
            language,
            modifier,
        }
    }

    /// Filename for the same subtitle in another language
    pub fn with_language(&self, language: &str) -> String {
        let mut name = self.base.clone();
        if let Some(track) = &self.track {
            name.push('.');
            name.push_str(track);
        }
        name.push('.');
        name.push_str(language);
        if let Some(modifier) = &self.modifier {
            name.push('.');
            name.push_str(modifier);
        }
        name.push('.');
        name.push_str(SRT_EXTENSION);
        name
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Language code carried by a subtitle filename, if any
pub fn detect_language_from_filename<P: AsRef<Path>>(path: P) -> Option<String> {
    SubtitleFileName::parse(&file_name_of(path.as_ref())).language
}

/// Output path for the translation of `input` into `target_language`
pub fn output_path<P1: AsRef<Path>, P2: AsRef<Path>>(input: P1, output_dir: P2, target_language: &str) -> PathBuf {
    let name = SubtitleFileName::parse(&file_name_of(input.as_ref()));
    output_dir.as_ref().join(name.with_language(target_language))
}

/// Whether a file already is a subtitle in `target_language`
pub fn is_translation_output<P: AsRef<Path>>(path: P, target_language: &str) -> bool {
    detect_language_from_filename(path)
        .map(|code| language_utils::language_codes_match(&code, target_language))
        .unwrap_or(false)
}
