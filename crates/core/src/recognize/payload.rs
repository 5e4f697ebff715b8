//! Serde model of the recognizer's detailed JSON response and its
//! conversion into the core's [`RecognizerOutput`].
//!
//! The wire format reports word timing in 100-nanosecond ticks; everything
//! is converted to milliseconds here so the rest of the pipeline never sees
//! ticks. Scalar scores are clamped into [0, 100] at this boundary.

use crate::recognize::{
    Phoneme, RecognitionStatus, RecognizeError, RecognizedWord, RecognizerOutput,
};
use serde::Deserialize;

/// 100 ns ticks per millisecond.
pub const TICKS_PER_MS: u64 = 10_000;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecognitionPayload {
    pub recognition_status: String,
    #[serde(default)]
    pub display_text: Option<String>,
    #[serde(default)]
    pub n_best: Vec<NBestEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NBestEntry {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub lexical: Option<String>,
    #[serde(default)]
    pub words: Vec<PayloadWord>,
    #[serde(default)]
    pub pronunciation_assessment: Option<UtteranceAssessment>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UtteranceAssessment {
    #[serde(default)]
    pub accuracy_score: Option<f64>,
    #[serde(default)]
    pub fluency_score: Option<f64>,
    #[serde(default)]
    pub prosody_score: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadWord {
    pub word: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub pronunciation_assessment: Option<WordAssessment>,
    #[serde(default)]
    pub phonemes: Option<Vec<PayloadPhoneme>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WordAssessment {
    #[serde(default)]
    pub accuracy_score: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadPhoneme {
    pub phoneme: String,
    #[serde(default)]
    pub pronunciation_assessment: Option<WordAssessment>,
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

impl RecognitionPayload {
    pub fn from_json(raw: &str) -> Result<Self, RecognizeError> {
        serde_json::from_str(raw).map_err(|e| RecognizeError::MalformedPayload(e.to_string()))
    }

    /// Translates the wire payload into the core's recognizer output.
    ///
    /// A successful recognition with no NBest hypothesis is malformed and
    /// never silently defaulted to a scoreable result.
    pub fn into_output(self) -> Result<RecognizerOutput, RecognizeError> {
        let status = match self.recognition_status.as_str() {
            "Success" => RecognitionStatus::Success,
            "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => RecognitionStatus::NoMatch,
            _ => RecognitionStatus::Failed,
        };

        if status != RecognitionStatus::Success {
            return Ok(RecognizerOutput {
                status,
                recognized_text: self.display_text.unwrap_or_default(),
                words: Vec::new(),
                fluency_score: 0.0,
                prosody_score: None,
            });
        }

        let best = self
            .n_best
            .into_iter()
            .next()
            .ok_or_else(|| RecognizeError::MalformedPayload("missing NBest".to_owned()))?;

        let recognized_text = best
            .display
            .or(best.lexical)
            .or(self.display_text)
            .unwrap_or_default();

        let words = best.words.into_iter().map(PayloadWord::into_word).collect();

        let assessment = best.pronunciation_assessment.unwrap_or(UtteranceAssessment {
            accuracy_score: None,
            fluency_score: None,
            prosody_score: None,
        });

        Ok(RecognizerOutput {
            status,
            recognized_text,
            words,
            fluency_score: clamp_score(assessment.fluency_score.unwrap_or(0.0)),
            prosody_score: assessment.prosody_score.map(clamp_score),
        })
    }
}

impl PayloadWord {
    fn into_word(self) -> RecognizedWord {
        let accuracy = self
            .pronunciation_assessment
            .and_then(|a| a.accuracy_score)
            .unwrap_or(0.0);
        let phonemes = self.phonemes.map(|ps| {
            ps.into_iter()
                .map(|p| Phoneme {
                    phoneme: p.phoneme,
                    accuracy_score: clamp_score(
                        p.pronunciation_assessment
                            .and_then(|a| a.accuracy_score)
                            .unwrap_or(0.0),
                    ),
                })
                .collect()
        });

        RecognizedWord {
            word: self.word,
            offset_ms: self.offset / TICKS_PER_MS,
            duration_ms: self.duration / TICKS_PER_MS,
            accuracy_score: clamp_score(accuracy),
            phonemes,
        }
    }
}
