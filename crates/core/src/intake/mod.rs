//! Coarse validation of submitted audio bytes before any external call.
//!
//! Every violated constraint is reported at once so the caller can show a
//! complete diagnostic instead of a first-failure guessing game.

use crate::config::AudioLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

const RIFF_TAG: &[u8; 4] = b"RIFF";
const WAVE_TAG: &[u8; 4] = b"WAVE";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntakeIssue {
    Empty,
    TooSmall { bytes: usize, min: usize },
    TooLarge { bytes: usize, max: usize },
    NotWav,
}

impl fmt::Display for IntakeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty audio"),
            Self::TooSmall { bytes, min } => {
                write!(f, "audio too small ({bytes} bytes, min {min})")
            }
            Self::TooLarge { bytes, max } => {
                write!(f, "audio too large ({bytes} bytes, max {max})")
            }
            Self::NotWav => f.write_str("not a WAV container (missing RIFF/WAVE signature)"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("audio validation failed: {}", format_issues(.issues))]
pub struct IntakeError {
    pub issues: Vec<IntakeIssue>,
}

fn format_issues(issues: &[IntakeIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks the 12-byte WAV container signature: `RIFF` at 0..4 and `WAVE`
/// at 8..12. Deliberately does not parse the container.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == RIFF_TAG && &bytes[8..12] == WAVE_TAG
}

/// Validates a raw submission against the configured byte bounds. Pure over
/// bytes; collects all violations rather than stopping at the first.
pub fn validate(bytes: &[u8], limits: &AudioLimits) -> Result<(), IntakeError> {
    validate_with(bytes, limits, false)
}

/// Like [`validate`], additionally requiring the canonical WAV signature.
pub fn validate_with(
    bytes: &[u8],
    limits: &AudioLimits,
    require_wav: bool,
) -> Result<(), IntakeError> {
    let mut issues = Vec::new();

    if bytes.is_empty() {
        issues.push(IntakeIssue::Empty);
    }
    if !bytes.is_empty() && bytes.len() < limits.min_bytes {
        issues.push(IntakeIssue::TooSmall {
            bytes: bytes.len(),
            min: limits.min_bytes,
        });
    }
    if bytes.len() > limits.max_bytes {
        issues.push(IntakeIssue::TooLarge {
            bytes: bytes.len(),
            max: limits.max_bytes,
        });
    }
    if require_wav && !is_wav(bytes) {
        issues.push(IntakeIssue::NotWav);
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(IntakeError { issues })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_header(total_len: usize) -> Vec<u8> {
        let mut v = vec![0u8; total_len.max(12)];
        v[0..4].copy_from_slice(b"RIFF");
        v[8..12].copy_from_slice(b"WAVE");
        v
    }

    #[test]
    fn empty_buffer_reports_empty_audio() {
        let err = validate(&[], &AudioLimits::default()).unwrap_err();
        assert_eq!(err.issues, vec![IntakeIssue::Empty]);
        assert!(err.to_string().contains("empty audio"));
    }

    #[test]
    fn undersized_buffer_rejected() {
        let err = validate(&[0u8; 100], &AudioLimits::default()).unwrap_err();
        assert_eq!(
            err.issues,
            vec![IntakeIssue::TooSmall {
                bytes: 100,
                min: 1024
            }]
        );
    }

    #[test]
    fn oversized_buffer_rejected() {
        let limits = AudioLimits {
            max_bytes: 2048,
            ..AudioLimits::default()
        };
        let err = validate(&[0u8; 4096], &limits).unwrap_err();
        assert_eq!(
            err.issues,
            vec![IntakeIssue::TooLarge {
                bytes: 4096,
                max: 2048
            }]
        );
    }

    #[test]
    fn collects_all_violations_at_once() {
        let limits = AudioLimits::default();
        let err = validate_with(&[0u8; 64], &limits, true).unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                IntakeIssue::TooSmall {
                    bytes: 64,
                    min: 1024
                },
                IntakeIssue::NotWav,
            ]
        );
    }

    #[test]
    fn in_range_buffer_passes() {
        assert!(validate(&wav_header(2048), &AudioLimits::default()).is_ok());
    }

    #[test]
    fn wav_signature_detection() {
        assert!(is_wav(&wav_header(12)));
        assert!(!is_wav(b"RIFFxxxx"));
        assert!(!is_wav(b"OggS\0\0\0\0\0\0\0\0"));
        let mut bad = wav_header(12);
        bad[8..12].copy_from_slice(b"AVI ");
        assert!(!is_wav(&bad));
    }
}
