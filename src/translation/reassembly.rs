/*!
 * Reassembly of translated batches.
 *
 * Merges batch outcomes back into one document in original order. Cues of
 * failed or never-dispatched batches keep their original text. Any structural
 * mismatch between the merged and the original document is a
 * `ConsistencyError`, which is fatal and distinct from batch failures.
 */

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::errors::{BatchFailure, ConsistencyError};
use crate::subtitle_processor::{Cue, SubtitleDocument};

use super::core::TranslationOutcome;

/// Merged document plus per-batch bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub document: SubtitleDocument,
    pub succeeded_batches: usize,
    pub failed_batches: usize,
    /// Cues whose text was replaced by a translation
    pub translated_cues: usize,
    /// Outcomes sorted by batch id
    pub outcomes: Vec<TranslationOutcome>,
}

impl TranslationResult {
    pub fn failures(&self) -> impl Iterator<Item = &BatchFailure> {
        self.outcomes.iter().filter_map(TranslationOutcome::failure)
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches == 0 && self.translated_cues == self.document.len()
    }
}

pub struct Reassembler;

impl Reassembler {
    /// Merge outcomes into a copy of `original`
    pub fn merge(original: &SubtitleDocument, outcomes: &[TranslationOutcome]) -> Result<TranslationResult, ConsistencyError> {
        let mut seen_batches = HashSet::with_capacity(outcomes.len());
        let mut replacements: HashMap<u32, &Cue> = HashMap::new();

        for outcome in outcomes {
            if !seen_batches.insert(outcome.batch_id) {
                return Err(ConsistencyError::DuplicateBatch(outcome.batch_id));
            }
            let Some(cues) = outcome.translated_cues() else {
                continue;
            };
            for cue in cues {
                let source = original.get(cue.index).ok_or(ConsistencyError::UnknownCue(cue.index))?;
                if source.start != cue.start || source.end != cue.end {
                    return Err(ConsistencyError::TimingMismatch(cue.index));
                }
                if replacements.insert(cue.index, cue).is_some() {
                    return Err(ConsistencyError::DuplicateCue(cue.index));
                }
            }
        }

        let merged: Vec<Cue> = original
            .cues()
            .iter()
            .map(|cue| replacements.get(&cue.index).map_or_else(|| cue.clone(), |t| (*t).clone()))
            .collect();

        Self::verify_structure(original, &merged)?;
        let document = SubtitleDocument::from_cues(merged)?;

        let mut sorted = outcomes.to_vec();
        sorted.sort_by_key(|outcome| outcome.batch_id);
        let succeeded_batches = sorted.iter().filter(|o| o.is_success()).count();
        let failed_batches = sorted.len() - succeeded_batches;

        debug!(
            "Reassembled {} cue(s): {} translated, {} batch(es) failed",
            document.len(),
            replacements.len(),
            failed_batches
        );

        Ok(TranslationResult {
            document,
            succeeded_batches,
            failed_batches,
            translated_cues: replacements.len(),
            outcomes: sorted,
        })
    }

    /// Same count, same indices in the same order, same timings
    fn verify_structure(original: &SubtitleDocument, merged: &[Cue]) -> Result<(), ConsistencyError> {
        if merged.len() != original.len() {
            return Err(ConsistencyError::CountMismatch {
                expected: original.len(),
                actual: merged.len(),
            });
        }
        for (position, (source, cue)) in original.cues().iter().zip(merged).enumerate() {
            if source.index != cue.index {
                return Err(ConsistencyError::OrderMismatch {
                    position: position + 1,
                    expected: source.index,
                    found: cue.index,
                });
            }
            if source.start != cue.start || source.end != cue.end {
                return Err(ConsistencyError::TimingMismatch(cue.index));
            }
        }
        Ok(())
    }
}
