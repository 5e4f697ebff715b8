//! End-to-end assessment pipeline: intake -> normalize -> recognize ->
//! align -> score -> assemble.
//!
//! One invocation per assessment request; stateless between calls, no
//! internal retries. The transcoder and recognizer are injected
//! collaborators so tests can run against deterministic fakes.

use crate::align::{self, AlignedWord, ErrorKind};
use crate::config::{AudioLimits, CanonicalSpec, Language, ReferenceText};
use crate::convert::{self, ConvertError, Transcoder};
use crate::intake::{self, IntakeError};
use crate::recognize::{RecognitionStatus, RecognizeError, Recognizer};
use crate::score::{self, ScoreSet};
use crate::text;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug)]
pub struct AssessmentRequest {
    pub reference_text: ReferenceText,
    pub audio: Bytes,
    pub language: Language,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineConfig {
    pub limits: AudioLimits,
    pub canonical: CanonicalSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WordResult {
    pub word: String,
    pub accuracy_score: f64,
    #[serde(rename = "errorType")]
    pub error_type: ErrorKind,
}

/// Terminal artifact of the pipeline, handed to the caller for
/// persistence and presentation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub recognition_status: RecognitionStatus,
    pub recognized_text: String,
    #[serde(flatten)]
    pub scores: ScoreSet,
    pub error_count: usize,
    pub words: Vec<WordResult>,
}

#[derive(thiserror::Error, Debug)]
pub enum AssessError {
    #[error("{0}")]
    InvalidInput(#[from] IntakeError),

    #[error("audio conversion failed: {0}")]
    ConversionFailed(#[from] ConvertError),

    #[error("recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("speech not recognized: {0}")]
    NoMatch(String),

    #[error("internal scoring error: {0}")]
    InternalScoring(String),
}

pub struct Assessor<T, R> {
    transcode: T,
    recognize: R,
    config: PipelineConfig,
    job_seq: AtomicU64,
}

impl<T, R> Assessor<T, R>
where
    T: Transcoder,
    R: Recognizer,
{
    pub fn new(transcode: T, recognize: R, config: PipelineConfig) -> Self {
        Self {
            transcode,
            recognize,
            config,
            job_seq: AtomicU64::new(1),
        }
    }

    /// Runs one full assessment. All failures come back as typed errors
    /// with human-readable reasons; a score is only produced when the
    /// recognition status is `Success`.
    pub async fn assess(&self, request: AssessmentRequest) -> Result<AssessmentResult, AssessError> {
        let job = self.job_seq.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            job,
            language = %request.language.as_str(),
            audio_bytes = request.audio.len(),
            "assessment started"
        );

        if let Err(err) = intake::validate(&request.audio, &self.config.limits) {
            tracing::warn!(job, error = %err, "audio rejected at intake");
            return Err(err.into());
        }

        let canonical = self.transcode.to_canonical_wav(request.audio).await?;
        let probe = convert::verify_canonical(&canonical, &self.config.canonical, &self.config.limits)?;
        tracing::debug!(
            job,
            sample_rate = probe.sample_rate,
            bits = probe.bits_per_sample,
            duration_secs = probe.duration_secs,
            "audio normalized"
        );

        let output = self
            .recognize
            .recognize(canonical, &request.reference_text, &request.language)
            .await
            .map_err(|e| self.map_recognize_error(job, e))?;

        match output.status {
            RecognitionStatus::Success => {}
            RecognitionStatus::NoMatch => {
                tracing::warn!(job, "recognizer found no match");
                return Err(AssessError::NoMatch(
                    "speech could not be recognized; make sure the audio is clear".to_owned(),
                ));
            }
            RecognitionStatus::Failed => {
                tracing::error!(job, "recognizer reported failure");
                return Err(AssessError::RecognitionFailed(
                    "recognizer reported a failed recognition".to_owned(),
                ));
            }
        }

        let reference_tokens = text::tokenize(request.reference_text.as_str());
        let recognized_tokens = text::tokenize(&output.recognized_text);
        let aligned = align::align(&reference_tokens, &recognized_tokens, &output.words);

        let word_duration_ms: u64 = output.words.iter().map(|w| w.duration_ms).sum();
        let prosody: Vec<f64> = output.prosody_score.into_iter().collect();
        let scores = score::score_all(
            &aligned,
            reference_tokens.len(),
            &[output.fluency_score],
            &[word_duration_ms],
            &prosody,
            output.status,
        );

        let result = assemble(output.status, output.recognized_text, scores, aligned);
        tracing::info!(
            job,
            overall = result.scores.overall_score,
            errors = result.error_count,
            "assessment complete"
        );
        Ok(result)
    }

    fn map_recognize_error(&self, job: u64, err: RecognizeError) -> AssessError {
        tracing::error!(job, error = %err, "recognizer call failed");
        match err {
            RecognizeError::MalformedPayload(m) => AssessError::InternalScoring(m),
            other => AssessError::RecognitionFailed(other.to_string()),
        }
    }
}

/// Merges alignment and scores into the final result; `error_count` is the
/// number of aligned tokens not tagged `None`.
fn assemble(
    status: RecognitionStatus,
    recognized_text: String,
    scores: ScoreSet,
    aligned: Vec<AlignedWord>,
) -> AssessmentResult {
    let error_count = aligned
        .iter()
        .filter(|w| w.error_kind != ErrorKind::None)
        .count();
    let words = aligned
        .into_iter()
        .map(|w| WordResult {
            word: w.word,
            accuracy_score: w.accuracy_score,
            error_type: w.error_kind,
        })
        .collect();

    AssessmentResult {
        recognition_status: status,
        recognized_text,
        scores,
        error_count,
        words,
    }
}
