use crate::config::{ApiKey, Language, ReferenceText};
use crate::recognize::{
    payload::RecognitionPayload, RecognizeError, Recognizer, RecognizerOutput,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use url::Url;

const RECOGNITION_PATH: &str = "speech/recognition/conversation/cognitiveservices/v1";
const WAV_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";

/// Short-audio REST adapter for the Azure pronunciation assessment service.
///
/// Assessment parameters travel in a base64-encoded `Pronunciation-Assessment`
/// header; the canonical WAV bytes are the request body.
#[derive(Clone)]
pub struct AzureRestRecognizer {
    client: Client,
    endpoint: Url,
    api_key: ApiKey,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AssessmentParams<'a> {
    reference_text: &'a str,
    grading_system: &'static str,
    granularity: &'static str,
    enable_miscue: bool,
    enable_prosody_assessment: bool,
}

impl AzureRestRecognizer {
    pub fn new(endpoint: &str, api_key: ApiKey) -> Result<Self, RecognizeError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| RecognizeError::InvalidEndpoint(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key,
        })
    }

    fn request_url(&self, language: &Language) -> Result<Url, RecognizeError> {
        let mut url = self
            .endpoint
            .join(RECOGNITION_PATH)
            .map_err(|e| RecognizeError::InvalidEndpoint(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("language", language.as_str())
            .append_pair("format", "detailed");
        Ok(url)
    }

    fn assessment_header(reference: &ReferenceText) -> Result<String, RecognizeError> {
        let params = AssessmentParams {
            reference_text: reference.as_str(),
            grading_system: "HundredMark",
            granularity: "Phoneme",
            enable_miscue: true,
            enable_prosody_assessment: true,
        };
        let json = serde_json::to_string(&params)
            .map_err(|e| RecognizeError::Api(format!("assessment params: {e}")))?;
        Ok(BASE64.encode(json))
    }
}

impl Recognizer for AzureRestRecognizer {
    fn recognize(
        &self,
        audio: Bytes,
        reference: &ReferenceText,
        language: &Language,
    ) -> BoxFuture<'_, Result<RecognizerOutput, RecognizeError>> {
        let this = self.clone();
        let reference = reference.clone();
        let language = language.clone();
        async move {
            let url = this.request_url(&language)?;
            let header = Self::assessment_header(&reference)?;

            tracing::debug!(language = %language.as_str(), bytes = audio.len(), "recognizer request");

            let response = this
                .client
                .post(url)
                .header("Ocp-Apim-Subscription-Key", this.api_key.expose())
                .header("Content-Type", WAV_CONTENT_TYPE)
                .header("Accept", "application/json")
                .header("Pronunciation-Assessment", header)
                .body(audio)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_owned());
                return Err(RecognizeError::Api(format!("HTTP {status}: {body}")));
            }

            let raw = response.text().await?;
            RecognitionPayload::from_json(&raw)?.into_output()
        }
        .boxed()
    }
}
