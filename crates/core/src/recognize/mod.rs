//! Boundary to the external speech recognizer.
//!
//! The recognizer is an opaque, possibly-slow, possibly-failing collaborator:
//! the core only defines the trait and the data it must hand back.

mod azure;
mod payload;
mod scripted;

use crate::config::{Language, ReferenceText};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use azure::AzureRestRecognizer;
pub use payload::{RecognitionPayload, TICKS_PER_MS};
pub use scripted::ScriptedRecognizer;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecognitionStatus {
    Success,
    Failed,
    NoMatch,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phoneme {
    pub phoneme: String,
    pub accuracy_score: f64,
}

/// One timed word unit from the recognizer. Immutable once received.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedWord {
    pub word: String,
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub accuracy_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonemes: Option<Vec<Phoneme>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognizerOutput {
    pub status: RecognitionStatus,
    pub recognized_text: String,
    pub words: Vec<RecognizedWord>,
    pub fluency_score: f64,
    pub prosody_score: Option<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum RecognizeError {
    #[error("recognizer network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("recognizer api error: {0}")]
    Api(String),

    #[error("recognizer endpoint invalid: {0}")]
    InvalidEndpoint(String),

    #[error("malformed recognizer payload: {0}")]
    MalformedPayload(String),
}

pub trait Recognizer: Send + Sync {
    fn recognize(
        &self,
        audio: Bytes,
        reference: &ReferenceText,
        language: &Language,
    ) -> BoxFuture<'_, Result<RecognizerOutput, RecognizeError>>;
}
