//! Normalizes arbitrary submitted audio into the canonical recognizer
//! format: mono, 16-bit linear PCM, 16 kHz, WAV container.

#[cfg(feature = "ffmpeg-sidecar")]
mod ffmpeg;

#[cfg(feature = "ffmpeg-sidecar")]
pub use ffmpeg::FfmpegTranscoder;

use crate::config::{AudioLimits, CanonicalSpec};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("transcoder unavailable: {0}")]
    Unavailable(String),

    #[error("transcoder failed: {0}")]
    Failed(String),

    #[error("transcoder timed out after {secs} s")]
    TimedOut { secs: u64 },

    #[error("transcoder io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("converted audio unreadable: {0}")]
    Unreadable(String),

    #[error("converted audio out of spec: {0}")]
    OutOfSpec(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// What a WAV header actually declares, plus the decoded duration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WavProbe {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub duration_secs: f64,
}

/// External transcoding engine. Implementations must return complete
/// canonical WAV bytes or an error; never partial output.
pub trait Transcoder: Send + Sync {
    fn to_canonical_wav(&self, audio: Bytes) -> BoxFuture<'_, Result<Bytes>>;
}

/// Re-validates normalizer output against the recognizer's hard
/// requirements. A conversion that nominally succeeded but produced
/// out-of-spec audio still fails here.
pub fn verify_canonical(bytes: &[u8], spec: &CanonicalSpec, limits: &AudioLimits) -> Result<WavProbe> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| ConvertError::Unreadable(e.to_string()))?;
    let header = reader.spec();
    let frames = reader.duration();
    let duration_secs = if header.sample_rate == 0 {
        0.0
    } else {
        f64::from(frames) / f64::from(header.sample_rate)
    };

    let probe = WavProbe {
        sample_rate: header.sample_rate,
        bits_per_sample: header.bits_per_sample,
        channels: header.channels,
        duration_secs,
    };

    let mut issues = Vec::new();
    if header.sample_rate != spec.sample_rate {
        issues.push(format!(
            "sample rate {} Hz (need {} Hz)",
            header.sample_rate, spec.sample_rate
        ));
    }
    if header.bits_per_sample != spec.bits_per_sample {
        issues.push(format!(
            "bit depth {}-bit (need {}-bit)",
            header.bits_per_sample, spec.bits_per_sample
        ));
    }
    if header.channels != spec.channels {
        issues.push(format!(
            "{} channels (need {})",
            header.channels, spec.channels
        ));
    }
    if duration_secs < limits.min_duration_secs {
        issues.push(format!(
            "duration {duration_secs:.2} s (min {:.1} s)",
            limits.min_duration_secs
        ));
    }
    if duration_secs > limits.max_duration_secs {
        issues.push(format!(
            "duration {duration_secs:.2} s (max {:.1} s)",
            limits.max_duration_secs
        ));
    }

    if issues.is_empty() {
        Ok(probe)
    } else {
        Err(ConvertError::OutOfSpec(issues.join("; ")))
    }
}

#[cfg(test)]
pub(crate) fn test_wav(sample_rate: u32, bits: u16, channels: u16, secs: f64) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("writable spec");
        let frames = (f64::from(sample_rate) * secs) as u32;
        for i in 0..frames * u32::from(channels) {
            writer.write_sample((i % 64) as i16).expect("write sample");
        }
        writer.finalize().expect("finalize");
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_wav_passes() {
        let bytes = test_wav(16_000, 16, 1, 2.0);
        let probe = verify_canonical(&bytes, &CanonicalSpec::default(), &AudioLimits::default())
            .expect("in spec");
        assert_eq!(probe.sample_rate, 16_000);
        assert_eq!(probe.bits_per_sample, 16);
        assert_eq!(probe.channels, 1);
        assert!((probe.duration_secs - 2.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_sample_rate_fails_even_after_successful_conversion() {
        let bytes = test_wav(44_100, 16, 1, 2.0);
        let err = verify_canonical(&bytes, &CanonicalSpec::default(), &AudioLimits::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutOfSpec(ref m) if m.contains("44100")));
    }

    #[test]
    fn stereo_fails() {
        let bytes = test_wav(16_000, 16, 2, 2.0);
        let err = verify_canonical(&bytes, &CanonicalSpec::default(), &AudioLimits::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutOfSpec(ref m) if m.contains("channels")));
    }

    #[test]
    fn too_short_duration_fails() {
        let bytes = test_wav(16_000, 16, 1, 0.2);
        let err = verify_canonical(&bytes, &CanonicalSpec::default(), &AudioLimits::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::OutOfSpec(ref m) if m.contains("min 0.5")));
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = verify_canonical(&[0u8; 64], &CanonicalSpec::default(), &AudioLimits::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Unreadable(_)));
    }
}
