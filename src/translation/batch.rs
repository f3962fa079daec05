/*!
 * Batch partitioning.
 *
 * Splits a subtitle document into ordered, contiguous batches that are
 * translated independently. Concatenating the batches in id order gives
 * back the original cue sequence.
 */

use log::debug;

use crate::errors::ConfigError;
use crate::language_utils::LanguagePair;
use crate::subtitle_processor::{Cue, SubtitleDocument};

/// A contiguous run of cues submitted to the service together
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 1-based position of the batch in the document
    pub batch_id: usize,
    pub cues: Vec<Cue>,
    pub languages: LanguagePair,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Range of cue indices covered, for log messages
    pub fn index_range(&self) -> Option<(u32, u32)> {
        Some((self.cues.first()?.index, self.cues.last()?.index))
    }
}

/// Splits documents into batches of at most `max_entries_per_batch` cues
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    max_entries_per_batch: usize,
}

impl Batcher {
    pub fn new(max_entries_per_batch: usize) -> Result<Self, ConfigError> {
        if max_entries_per_batch == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(Self { max_entries_per_batch })
    }

    pub fn max_entries_per_batch(&self) -> usize {
        self.max_entries_per_batch
    }

    /// Number of batches `split` produces for `total_cues`
    pub fn batch_count(&self, total_cues: usize) -> usize {
        total_cues.div_ceil(self.max_entries_per_batch)
    }

    /// Partition the document in order; the last batch may be smaller
    pub fn split(&self, document: &SubtitleDocument, languages: &LanguagePair) -> Vec<Batch> {
        let batches: Vec<Batch> = document
            .cues()
            .chunks(self.max_entries_per_batch)
            .enumerate()
            .map(|(i, chunk)| Batch {
                batch_id: i + 1,
                cues: chunk.to_vec(),
                languages: languages.clone(),
            })
            .collect();

        debug!(
            "Split {} cues into {} batch(es) of up to {}",
            document.len(),
            batches.len(),
            self.max_entries_per_batch
        );
        batches
    }
}
