//! Score arithmetic over the aligned token stream plus the recognizer's
//! utterance-level scalars. Every function here is pure; all results are
//! integers in [0, 100], rounded half away from zero.

use crate::align::{AlignedWord, ErrorKind};
use crate::recognize::RecognitionStatus;
use serde::{Deserialize, Serialize};

/// The four component scores feeding the overall weighting.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreComponents {
    pub accuracy: u8,
    pub fluency: u8,
    pub completeness: u8,
    pub prosody: u8,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSet {
    pub accuracy_score: u8,
    pub fluency_score: u8,
    pub completeness_score: u8,
    pub prosody_score: u8,
    pub overall_score: u8,
}

fn round_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Fraction of reference tokens successfully matched.
///
/// Matched means tagged `None` with non-zero accuracy. A zero-token
/// reference is complete by convention.
pub fn completeness(aligned: &[AlignedWord], reference_token_count: usize) -> u8 {
    if reference_token_count == 0 {
        return 100;
    }
    let matched = aligned
        .iter()
        .filter(|w| w.error_kind == ErrorKind::None && w.accuracy_score > 0.0)
        .count();
    let ratio = 100.0 * matched as f64 / reference_token_count as f64;
    round_score(ratio.min(100.0))
}

/// Mean per-word accuracy, excluding insertions (omissions count as zero).
pub fn accuracy(aligned: &[AlignedWord]) -> u8 {
    let eligible: Vec<f64> = aligned
        .iter()
        .filter(|w| w.error_kind != ErrorKind::Insertion)
        .map(|w| w.accuracy_score)
        .collect();
    if eligible.is_empty() {
        return 0;
    }
    round_score(eligible.iter().sum::<f64>() / eligible.len() as f64)
}

/// Duration-weighted average of the recognizer's fluency units, whatever
/// granularity the recognizer reports them at.
pub fn fluency(scores: &[f64], durations_ms: &[u64]) -> u8 {
    let total: u64 = durations_ms.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted: f64 = scores
        .iter()
        .zip(durations_ms)
        .map(|(score, duration)| score * *duration as f64)
        .sum();
    round_score(weighted / total as f64)
}

/// Arithmetic mean of the recognizer's prosody scalars.
pub fn prosody(scores: &[f64]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    round_score(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Combines the four components, weighting the weakest dimension highest
/// (0.4/0.2/0.2/0.2 over the ascending sort) so a single weak dimension
/// drags the overall score harder than an unweighted mean would.
///
/// When the recognition outcome is neither clearly successful nor clearly
/// failed, only accuracy and fluency are trusted (0.5/0.5).
pub fn overall(status: RecognitionStatus, components: &ScoreComponents) -> u8 {
    match status {
        RecognitionStatus::Success | RecognitionStatus::Failed => {
            let mut sorted = [
                components.accuracy,
                components.fluency,
                components.completeness,
                components.prosody,
            ];
            sorted.sort_unstable();
            round_score(
                f64::from(sorted[0]) * 0.4
                    + f64::from(sorted[1]) * 0.2
                    + f64::from(sorted[2]) * 0.2
                    + f64::from(sorted[3]) * 0.2,
            )
        }
        RecognitionStatus::NoMatch => round_score(
            f64::from(components.accuracy) * 0.5 + f64::from(components.fluency) * 0.5,
        ),
    }
}

/// Computes the full score set for one assessment.
pub fn score_all(
    aligned: &[AlignedWord],
    reference_token_count: usize,
    fluency_scores: &[f64],
    fluency_durations_ms: &[u64],
    prosody_scores: &[f64],
    status: RecognitionStatus,
) -> ScoreSet {
    let components = ScoreComponents {
        accuracy: accuracy(aligned),
        fluency: fluency(fluency_scores, fluency_durations_ms),
        completeness: completeness(aligned, reference_token_count),
        prosody: prosody(prosody_scores),
    };
    ScoreSet {
        accuracy_score: components.accuracy,
        fluency_score: components.fluency,
        completeness_score: components.completeness,
        prosody_score: components.prosody,
        overall_score: overall(status, &components),
    }
}
