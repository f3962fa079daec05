use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ConsistencyError, ParseError};

// @module: SRT parsing, serialization and the subtitle data model

// @const: SRT timing line, trailing cue settings allowed
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2}),(\d{3})")
        .expect("timing regex is valid")
});

// @const: UTF-8 byte order mark
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// @const: Bytes Windows-1252 leaves undefined
const WINDOWS_1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

// @struct: Point in time, millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    /// Saturates at `u64::MAX` milliseconds
    pub fn from_parts(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Self {
        Timestamp(Self::total_millis(hours, minutes, seconds, millis).unwrap_or(u64::MAX))
    }

    fn total_millis(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
        hours
            .checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1_000)?
            .checked_add(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Parse an `HH:MM:SS,mmm` timestamp
    pub fn parse(text: &str) -> Option<Self> {
        let (hms, millis) = text.trim().split_once(',')?;
        let mut parts = hms.split(':');
        let hours = parts.next()?;
        let minutes = parts.next()?;
        let seconds = parts.next()?;
        if parts.next().is_some() || hours.len() < 2 || minutes.len() != 2 || seconds.len() != 2 || millis.len() != 3 {
            return None;
        }
        Self::checked(hours, minutes, seconds, millis)
    }

    fn checked(hours: &str, minutes: &str, seconds: &str, millis: &str) -> Option<Self> {
        let hours: u64 = hours.parse().ok()?;
        let minutes: u64 = minutes.parse().ok()?;
        let seconds: u64 = seconds.parse().ok()?;
        let millis: u64 = millis.parse().ok()?;
        if minutes >= 60 || seconds >= 60 {
            return None;
        }
        Self::total_millis(hours, minutes, seconds, millis).map(Timestamp)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ms = self.0;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;
        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: 1-based position in the source file
    pub index: u32,

    // @field: Display start
    pub start: Timestamp,

    // @field: Display end
    pub end: Timestamp,

    // @field: Text lines, trimmed and non-empty
    pub lines: Vec<String>,
}

impl Cue {
    pub fn new(index: u32, start: Timestamp, end: Timestamp, lines: Vec<String>) -> Self {
        Cue { index, start, end, lines }
    }

    /// Cue text with lines joined by newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Copy of this cue with its text replaced; timing and index are kept
    pub fn with_text(&self, text: &str) -> Self {
        Cue {
            index: self.index,
            start: self.start,
            end: self.end,
            lines: split_text_lines(text),
        }
    }

    fn is_well_formed(&self) -> bool {
        self.start <= self.end && !self.lines.is_empty() && self.lines.iter().all(|l| !l.trim().is_empty())
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.start, self.end)?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Split translated or raw text into trimmed, non-empty lines
pub fn split_text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered, immutable collection of cues
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtitleDocument {
    cues: Vec<Cue>,
}

impl SubtitleDocument {
    /// Build a document, checking that indices strictly increase and every cue is well formed
    pub fn from_cues(cues: Vec<Cue>) -> std::result::Result<Self, ConsistencyError> {
        let mut previous: Option<u32> = None;
        for (position, cue) in cues.iter().enumerate() {
            if let Some(prev) = previous {
                if cue.index <= prev {
                    return Err(ConsistencyError::OrderMismatch {
                        position: position + 1,
                        expected: prev + 1,
                        found: cue.index,
                    });
                }
            }
            if !cue.is_well_formed() {
                return Err(ConsistencyError::InvalidCue(cue.index));
            }
            previous = Some(cue.index);
        }
        Ok(SubtitleDocument { cues })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Cue> {
        self.cues
            .binary_search_by_key(&index, |cue| cue.index)
            .ok()
            .map(|pos| &self.cues[pos])
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&SrtCodec::serialize(self))
    }
}

// @struct: SRT reader and writer
pub struct SrtCodec;

impl SrtCodec {
    /// Decode raw bytes, trying UTF-8, then Latin-1, then Windows-1252
    pub fn decode(bytes: &[u8]) -> std::result::Result<String, ParseError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        if let Ok(text) = std::str::from_utf8(bytes) {
            return Ok(text.to_string());
        }
        if let Some(text) = decode_latin1(bytes) {
            debug!("Subtitle content decoded as Latin-1");
            return Ok(text);
        }
        if let Some(text) = decode_windows_1252(bytes) {
            debug!("Subtitle content decoded as Windows-1252");
            return Ok(text);
        }
        Err(ParseError::Encoding)
    }

    /// Parse SRT text into a document
    pub fn parse(content: &str) -> std::result::Result<SubtitleDocument, ParseError> {
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

        let mut cues = Vec::new();
        let mut block: Vec<(usize, &str)> = Vec::new();

        for (line_idx, line) in normalized.split('\n').enumerate() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    cues.push(Self::parse_block(&block, cues.len() as u32 + 1)?);
                    block.clear();
                }
                continue;
            }
            block.push((line_idx + 1, line));
        }
        if !block.is_empty() {
            cues.push(Self::parse_block(&block, cues.len() as u32 + 1)?);
        }

        let overlaps = cues.windows(2).filter(|w| w[0].end > w[1].start).count();
        if overlaps > 0 {
            warn!("Found {} overlapping subtitle cues", overlaps);
        }
        debug!("Parsed {} subtitle cues", cues.len());

        Ok(SubtitleDocument { cues })
    }

    // @requires: block is non-empty and contains no blank lines
    fn parse_block(block: &[(usize, &str)], index: u32) -> std::result::Result<Cue, ParseError> {
        let (seq_line, seq_text) = block[0];
        let seq_trimmed = seq_text.trim().trim_start_matches('\u{feff}');
        if seq_trimmed.parse::<u64>().is_err() {
            return Err(ParseError::InvalidSequenceNumber {
                line: seq_line,
                found: seq_text.to_string(),
            });
        }

        let Some(&(timing_line, timing_text)) = block.get(1) else {
            return Err(ParseError::InvalidTimestamp {
                line: seq_line + 1,
                found: String::new(),
            });
        };
        let (start, end) = Self::parse_timing(timing_text).ok_or_else(|| ParseError::InvalidTimestamp {
            line: timing_line,
            found: timing_text.to_string(),
        })?;

        let lines: Vec<String> = block[2..].iter().map(|(_, l)| l.trim().to_string()).collect();
        if lines.is_empty() {
            return Err(ParseError::EmptyText { index });
        }
        if start > end {
            return Err(ParseError::InvertedTimeRange { index });
        }

        Ok(Cue::new(index, start, end, lines))
    }

    fn parse_timing(line: &str) -> Option<(Timestamp, Timestamp)> {
        let caps = TIMING_REGEX.captures(line.trim())?;
        let start = Timestamp::checked(&caps[1], &caps[2], &caps[3], &caps[4])?;
        let end = Timestamp::checked(&caps[5], &caps[6], &caps[7], &caps[8])?;
        Some((start, end))
    }

    /// Decode and parse raw SRT bytes
    pub fn parse_bytes(bytes: &[u8]) -> std::result::Result<SubtitleDocument, ParseError> {
        let text = Self::decode(bytes)?;
        Self::parse(&text)
    }

    /// Write a document as SRT, renumbering cues from 1
    pub fn serialize(document: &SubtitleDocument) -> String {
        let mut output = String::new();
        for (position, cue) in document.cues().iter().enumerate() {
            if position > 0 {
                output.push('\n');
            }
            output.push_str(&format!("{}\n{} --> {}\n", position + 1, cue.start, cue.end));
            for line in &cue.lines {
                output.push_str(line);
                output.push('\n');
            }
        }
        output
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<SubtitleDocument> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let document = Self::parse_bytes(&bytes).with_context(|| format!("Failed to parse subtitle file: {}", path.display()))?;
        Ok(document)
    }

    pub fn write_file<P: AsRef<Path>>(path: P, document: &SubtitleDocument) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, Self::serialize(document))
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }
}

/// Latin-1 decode, rejected when C1 control bytes (0x80..=0x9F) appear
///
/// Real subtitle text never contains C1 controls, so such input is handed on
/// to Windows-1252, which assigns printable characters to most of that range.
/// Without C1 bytes Windows-1252 and Latin-1 map every byte identically.
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| (0x80..=0x9F).contains(b)) {
        return None;
    }
    let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (!had_errors).then(|| text.into_owned())
}

/// Windows-1252 decode, rejected when one of its five undefined bytes appears
fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    if bytes.iter().any(|b| WINDOWS_1252_UNDEFINED.contains(b)) {
        return None;
    }
    let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (!had_errors).then(|| text.into_owned())
}
