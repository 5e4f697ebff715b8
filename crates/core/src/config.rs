use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_CONVERT_TIMEOUT_SECS: u64 = 30;
pub const REFERENCE_TEXT_MIN_CHARS: usize = 1;
pub const REFERENCE_TEXT_MAX_CHARS: usize = 500;
pub const ENV_AZURE_SPEECH_KEY: &str = "AZURE_SPEECH_KEY";
pub const ENV_AZURE_SPEECH_ENDPOINT: &str = "AZURE_SPEECH_ENDPOINT";
pub const ENV_ASSESS_LANGUAGE: &str = "ASSESS_LANGUAGE";

/// The text the speaker should have said, validated at construction so the
/// pipeline never sees an out-of-range reference.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceText(String);

impl ReferenceText {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        let chars = v.chars().count();
        if chars < REFERENCE_TEXT_MIN_CHARS {
            return Err(ConfigError::EmptyReferenceText);
        }
        if chars > REFERENCE_TEXT_MAX_CHARS {
            return Err(ConfigError::ReferenceTextTooLong { chars });
        }
        if v.chars().any(|c| c.is_control() || c == '<' || c == '>') {
            return Err(ConfigError::ReferenceTextForbiddenChars);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// BCP-47-style recognition language tag, e.g. `en-US` or `zh-TW`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language(String);

impl Language {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(DEFAULT_LANGUAGE.to_owned())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

/// Byte-length and duration bounds for submitted audio.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioLimits {
    pub min_bytes: usize,
    pub max_bytes: usize,
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self {
            min_bytes: 1024,
            max_bytes: 50 * 1024 * 1024,
            min_duration_secs: 0.5,
            max_duration_secs: 55.0,
        }
    }
}

/// The audio format the external recognizer hard-requires.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl Default for CanonicalSpec {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            bits_per_sample: 16,
            channels: 1,
        }
    }
}

/// Wall-clock budget for one transcoder invocation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConvertBudget {
    pub timeout_secs: u64,
}

impl ConvertBudget {
    pub fn new(timeout_secs: u64) -> Result<Self, ConfigError> {
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroConvertTimeout);
        }
        Ok(Self { timeout_secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConvertBudget {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CONVERT_TIMEOUT_SECS,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("reference text must not be empty")]
    EmptyReferenceText,
    #[error("reference text too long ({chars} chars, max {REFERENCE_TEXT_MAX_CHARS})")]
    ReferenceTextTooLong { chars: usize },
    #[error("reference text must not contain control characters or HTML markup")]
    ReferenceTextForbiddenChars,
    #[error("language must not be empty")]
    EmptyLanguage,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("convert timeout must be > 0 s")]
    ZeroConvertTimeout,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_text_accepts_plain_sentence() {
        let t = ReferenceText::new("the quick brown fox").expect("valid");
        assert_eq!(t.as_str(), "the quick brown fox");
    }

    #[test]
    fn reference_text_rejects_empty() {
        assert_eq!(
            ReferenceText::new("").unwrap_err(),
            ConfigError::EmptyReferenceText
        );
    }

    #[test]
    fn reference_text_rejects_over_limit() {
        let long = "a".repeat(REFERENCE_TEXT_MAX_CHARS + 1);
        assert!(matches!(
            ReferenceText::new(long).unwrap_err(),
            ConfigError::ReferenceTextTooLong { chars: 501 }
        ));
    }

    #[test]
    fn reference_text_rejects_markup_and_control() {
        assert_eq!(
            ReferenceText::new("say <b>this</b>").unwrap_err(),
            ConfigError::ReferenceTextForbiddenChars
        );
        assert_eq!(
            ReferenceText::new("line\u{0007}bell").unwrap_err(),
            ConfigError::ReferenceTextForbiddenChars
        );
    }

    #[test]
    fn reference_text_counts_chars_not_bytes() {
        let t = "é".repeat(REFERENCE_TEXT_MAX_CHARS);
        assert!(ReferenceText::new(t).is_ok());
    }

    #[test]
    fn convert_budget_rejects_zero() {
        assert_eq!(
            ConvertBudget::new(0).unwrap_err(),
            ConfigError::ZeroConvertTimeout
        );
        assert_eq!(ConvertBudget::new(5).unwrap().duration(), Duration::from_secs(5));
    }

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_AZURE_SPEECH_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_AZURE_SPEECH_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_AZURE_SPEECH_KEY, "env-key");
        let key = resolve_api_key(None, ENV_AZURE_SPEECH_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn language_default_resolution_falls_back() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_ASSESS_LANGUAGE, &env, DEFAULT_LANGUAGE);
        assert_eq!(v, "en-US");
    }
}
