//! Aligns reference tokens against recognized tokens and classifies every
//! token as a match, an omission, or an insertion.
//!
//! A substitution is deliberately expanded into an Insertion plus an
//! Omission rather than a partial match; completeness and accuracy
//! arithmetic depend on that exact expansion.

use crate::recognize::RecognizedWord;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    None,
    Omission,
    Insertion,
}

/// A reference or recognized token after alignment. Omissions carry the
/// reference word text with zeroed timing and accuracy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlignedWord {
    pub word: String,
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub accuracy_score: f64,
    pub error_kind: ErrorKind,
}

impl AlignedWord {
    fn matched(word: &RecognizedWord) -> Self {
        Self {
            word: word.word.clone(),
            offset_ms: word.offset_ms,
            duration_ms: word.duration_ms,
            accuracy_score: word.accuracy_score,
            error_kind: ErrorKind::None,
        }
    }

    fn omitted(reference_word: &str) -> Self {
        Self {
            word: reference_word.to_owned(),
            offset_ms: 0,
            duration_ms: 0,
            accuracy_score: 0.0,
            error_kind: ErrorKind::Omission,
        }
    }

    fn inserted(word: &RecognizedWord) -> Self {
        Self {
            word: word.word.clone(),
            offset_ms: word.offset_ms,
            duration_ms: word.duration_ms,
            accuracy_score: word.accuracy_score,
            error_kind: ErrorKind::Insertion,
        }
    }
}

/// Aligns `reference` tokens against `recognized` tokens; `words` is the
/// recognizer's per-word timed data, index-aligned with `recognized`.
///
/// Opcode translation:
/// - equal  -> recognizer words tagged `None`
/// - delete -> zero-filled `Omission` per skipped reference token
/// - insert -> recognizer words tagged `Insertion`
/// - replace -> `Insertion` over the recognized range, then `Omission`
///   over the reference range
pub fn align(
    reference: &[String],
    recognized: &[String],
    words: &[RecognizedWord],
) -> Vec<AlignedWord> {
    let ops = capture_diff_slices(Algorithm::Myers, reference, recognized);
    let mut aligned = Vec::with_capacity(reference.len() + recognized.len());

    for op in ops {
        match op {
            DiffOp::Equal {
                new_index, len, ..
            } => {
                for i in new_index..new_index + len {
                    match words.get(i) {
                        Some(word) => aligned.push(AlignedWord::matched(word)),
                        // Recognizer word list shorter than its own
                        // transcript; keep the token with zeroed data.
                        None => aligned.push(AlignedWord {
                            word: recognized[i].clone(),
                            offset_ms: 0,
                            duration_ms: 0,
                            accuracy_score: 0.0,
                            error_kind: ErrorKind::None,
                        }),
                    }
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                push_omissions(&mut aligned, reference, old_index, old_len);
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                push_insertions(&mut aligned, words, new_index, new_len);
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                push_insertions(&mut aligned, words, new_index, new_len);
                push_omissions(&mut aligned, reference, old_index, old_len);
            }
        }
    }

    aligned
}

fn push_omissions(out: &mut Vec<AlignedWord>, reference: &[String], start: usize, len: usize) {
    for token in &reference[start..start + len] {
        out.push(AlignedWord::omitted(token));
    }
}

fn push_insertions(out: &mut Vec<AlignedWord>, words: &[RecognizedWord], start: usize, len: usize) {
    for i in start..start + len {
        if let Some(word) = words.get(i) {
            out.push(AlignedWord::inserted(word));
        }
    }
}
