#![deny(warnings)]

use anyhow::Context;
use clap::{ArgGroup, Parser};
use speakscore_core::config::{
    resolve_api_key, resolve_optional_string, resolve_string_with_default, ConvertBudget, Env,
    Language, ReferenceText, StdEnv, DEFAULT_CONVERT_TIMEOUT_SECS, DEFAULT_LANGUAGE,
    ENV_ASSESS_LANGUAGE, ENV_AZURE_SPEECH_ENDPOINT, ENV_AZURE_SPEECH_KEY,
};
use speakscore_core::convert::FfmpegTranscoder;
use speakscore_core::pipeline::{AssessmentRequest, Assessor, PipelineConfig};
use speakscore_core::recognize::{
    AzureRestRecognizer, RecognitionPayload, RecognizeError, Recognizer, RecognizerOutput,
    ScriptedRecognizer,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "speakscore")]
#[command(about = "Pronunciation assessment: audio + reference text -> per-word errors and scores")]
#[command(group(
    ArgGroup::new("recognizer")
        .required(true)
        .multiple(false)
        .args(["azure_endpoint", "recognizer_json"])
))]
struct Args {
    /// Audio file to assess (any common codec; converted to WAV as needed)
    #[arg(long)]
    audio: std::path::PathBuf,

    /// Reference text the speaker should have said
    #[arg(long)]
    text: String,

    #[arg(long)]
    language: Option<String>,

    /// Azure speech endpoint, e.g. https://eastus.stt.speech.microsoft.com/
    #[arg(long, env = ENV_AZURE_SPEECH_ENDPOINT)]
    azure_endpoint: Option<String>,

    #[arg(long)]
    azure_key: Option<String>,

    /// Captured recognizer JSON payload for an offline run
    #[arg(long)]
    recognizer_json: Option<std::path::PathBuf>,

    #[arg(long, default_value_t = DEFAULT_CONVERT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

enum CliRecognizer {
    Azure(AzureRestRecognizer),
    Scripted(ScriptedRecognizer),
}

impl Recognizer for CliRecognizer {
    fn recognize(
        &self,
        audio: bytes::Bytes,
        reference: &ReferenceText,
        language: &Language,
    ) -> futures::future::BoxFuture<'_, Result<RecognizerOutput, RecognizeError>> {
        match self {
            Self::Azure(inner) => inner.recognize(audio, reference, language),
            Self::Scripted(inner) => inner.recognize(audio, reference, language),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let reference_text = ReferenceText::new(args.text.clone())?;
    let language = Language::new(resolve_string_with_default(
        args.language.clone(),
        ENV_ASSESS_LANGUAGE,
        &env,
        DEFAULT_LANGUAGE,
    ))?;

    let recognizer = build_recognizer(&args, &env).await?;
    let transcoder = FfmpegTranscoder::new(ConvertBudget::new(args.timeout_secs)?);
    let assessor = Assessor::new(transcoder, recognizer, PipelineConfig::default());

    let audio = tokio::fs::read(&args.audio)
        .await
        .map(bytes::Bytes::from)
        .with_context(|| format!("cannot read audio file {}", args.audio.display()))?;
    tracing::info!(
        audio = %args.audio.display(),
        language = %language.as_str(),
        "assessing pronunciation"
    );

    let result = assessor
        .assess(AssessmentRequest {
            reference_text,
            audio,
            language,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn build_recognizer(args: &Args, env: &impl Env) -> anyhow::Result<CliRecognizer> {
    if let Some(path) = &args.recognizer_json {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read recognizer payload {}", path.display()))?;
        let output = RecognitionPayload::from_json(&raw)?.into_output()?;
        return Ok(CliRecognizer::Scripted(ScriptedRecognizer::new(output)));
    }

    let endpoint = resolve_optional_string(
        args.azure_endpoint.clone(),
        ENV_AZURE_SPEECH_ENDPOINT,
        env,
    )
    .context("azure endpoint missing")?;
    let key = resolve_api_key(args.azure_key.clone(), ENV_AZURE_SPEECH_KEY, env)?
        .context("azure key missing (pass --azure-key or set AZURE_SPEECH_KEY)")?;

    Ok(CliRecognizer::Azure(AzureRestRecognizer::new(
        &endpoint, key,
    )?))
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
