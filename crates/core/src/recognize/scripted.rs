use crate::config::{Language, ReferenceText};
use crate::recognize::{RecognizeError, Recognizer, RecognizerOutput};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Recognizer that replays a canned output. Used for offline CLI runs
/// against a captured payload and for deterministic pipeline tests.
#[derive(Clone)]
pub struct ScriptedRecognizer {
    output: RecognizerOutput,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn new(output: RecognizerOutput) -> Self {
        Self {
            output,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `recognize` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(
        &self,
        _audio: Bytes,
        _reference: &ReferenceText,
        _language: &Language,
    ) -> BoxFuture<'_, Result<RecognizerOutput, RecognizeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = self.output.clone();
        async move { Ok(output) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::RecognitionStatus;

    #[tokio::test]
    async fn replays_output_and_counts_calls() {
        let scripted = ScriptedRecognizer::new(RecognizerOutput {
            status: RecognitionStatus::Success,
            recognized_text: "hello".to_owned(),
            words: Vec::new(),
            fluency_score: 90.0,
            prosody_score: None,
        });
        assert_eq!(scripted.call_count(), 0);

        let out = scripted
            .recognize(
                Bytes::from_static(b"audio"),
                &ReferenceText::new("hello").expect("valid"),
                &Language::default(),
            )
            .await
            .expect("scripted");
        assert_eq!(out.recognized_text, "hello");
        assert_eq!(scripted.call_count(), 1);
    }
}
