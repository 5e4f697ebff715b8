use crate::config::ConvertBudget;
use crate::convert::{ConvertError, Result, Transcoder};
use crate::intake;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Transcodes arbitrary-codec audio to canonical WAV by driving ffmpeg as a
/// scoped subprocess.
///
/// Already-canonical input (WAV signature present) passes through
/// byte-for-byte. On-disk artifacts live in a [`tempfile::TempDir`] whose
/// drop removes them on success, failure, and timeout alike.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    budget: ConvertBudget,
    // None => ffmpeg-sidecar managed binary
    program: Option<PathBuf>,
    // None => system temp
    temp_root: Option<PathBuf>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new(ConvertBudget::default())
    }
}

impl FfmpegTranscoder {
    pub fn new(budget: ConvertBudget) -> Self {
        Self {
            budget,
            program: None,
            temp_root: None,
        }
    }

    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_temp_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(p) => Ok(p.clone()),
            None => {
                ffmpeg_sidecar::download::auto_download()
                    .map_err(|e| ConvertError::Unavailable(e.to_string()))?;
                Ok(ffmpeg_sidecar::paths::ffmpeg_path())
            }
        }
    }

    fn make_temp_dir(&self) -> Result<tempfile::TempDir> {
        let dir = match &self.temp_root {
            Some(root) => tempfile::Builder::new()
                .prefix("transcode_")
                .tempdir_in(root)?,
            None => tempfile::Builder::new().prefix("transcode_").tempdir()?,
        };
        Ok(dir)
    }

    async fn run_ffmpeg(&self, program: &Path, input: &Path, output: &Path) -> Result<()> {
        let mut child = tokio::process::Command::new(program)
            .arg("-hide_banner")
            .arg("-nostdin")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(input)
            .args(["-vn", "-sn", "-dn"])
            .args(["-ac", "1"])
            .args(["-ar", "16000"])
            .args(["-acodec", "pcm_s16le"])
            .arg("-y")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConvertError::Failed(format!("spawn: {e}")))?;

        let mut stderr = child.stderr.take().ok_or_else(|| {
            ConvertError::Failed("ffmpeg stderr unavailable (pipe not created)".to_owned())
        })?;
        let stderr_task = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await?;
            Ok::<Vec<u8>, std::io::Error>(buf)
        });

        let status = match tokio::time::timeout(self.budget.duration(), child.wait()).await {
            Ok(waited) => waited.map_err(|e| ConvertError::Failed(e.to_string()))?,
            Err(_) => {
                // Cancellation is a kill; whatever ffmpeg wrote so far is
                // discarded with the temp dir.
                let _ = child.start_kill();
                let _ = child.wait().await;
                stderr_task.abort();
                tracing::warn!(secs = self.budget.timeout_secs, "transcoder timed out, killed");
                return Err(ConvertError::TimedOut {
                    secs: self.budget.timeout_secs,
                });
            }
        };

        let stderr_bytes = stderr_task
            .await
            .map_err(|e| ConvertError::Failed(e.to_string()))?
            .map_err(|e| ConvertError::Failed(e.to_string()))?;

        if !status.success() {
            let stderr_s = String::from_utf8_lossy(&stderr_bytes).trim().to_owned();
            return Err(ConvertError::Failed(format!(
                "exit_code={:?} stderr={stderr_s}",
                status.code()
            )));
        }
        Ok(())
    }

    async fn transcode(&self, audio: Bytes) -> Result<Bytes> {
        let program = self.resolve_program()?;
        let dir = self.make_temp_dir()?;
        let input = dir.path().join("in.audio");
        let output = dir.path().join("out.wav");

        tokio::fs::write(&input, &audio).await?;
        tracing::debug!(bytes = audio.len(), "transcoding to canonical wav");

        self.run_ffmpeg(&program, &input, &output).await?;

        let converted = tokio::fs::read(&output).await.map_err(|e| {
            ConvertError::Failed(format!("transcoder produced no output: {e}"))
        })?;
        tracing::debug!(bytes = converted.len(), "transcode complete");
        Ok(Bytes::from(converted))
    }
}

impl Transcoder for FfmpegTranscoder {
    fn to_canonical_wav(&self, audio: Bytes) -> BoxFuture<'_, Result<Bytes>> {
        async move {
            // Idempotence: already-canonical containers pass through
            // byte-for-byte without touching ffmpeg.
            if intake::is_wav(&audio) {
                tracing::debug!("input already wav, passing through");
                return Ok(audio);
            }
            self.transcode(audio).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes() -> Bytes {
        Bytes::from(crate::convert::test_wav(16_000, 16, 1, 1.0))
    }

    #[tokio::test]
    async fn wav_input_passes_through_byte_identical() {
        let transcoder = FfmpegTranscoder::default().with_program("/nonexistent/ffmpeg");
        let input = wav_bytes();
        let out = transcoder
            .to_canonical_wav(input.clone())
            .await
            .expect("passthrough");
        assert_eq!(out, input);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_process_and_leaves_no_temp_files() {
        use std::os::unix::fs::PermissionsExt;

        let scratch = tempfile::tempdir().expect("scratch dir");
        let fake_ffmpeg = scratch.path().join("slow-ffmpeg.sh");
        std::fs::write(&fake_ffmpeg, "#!/bin/sh\nsleep 30\n").expect("write stub");
        std::fs::set_permissions(&fake_ffmpeg, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");

        let temp_root = scratch.path().join("work");
        std::fs::create_dir(&temp_root).expect("work dir");

        let transcoder = FfmpegTranscoder::new(ConvertBudget::new(1).expect("nonzero"))
            .with_program(&fake_ffmpeg)
            .with_temp_root(&temp_root);

        let err = transcoder
            .to_canonical_wav(Bytes::from_static(b"OggSnotawavfile"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::TimedOut { secs: 1 }));

        let leftovers: Vec<_> = std::fs::read_dir(&temp_root)
            .expect("readable work dir")
            .collect();
        assert!(leftovers.is_empty(), "temp artifacts not cleaned up");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_discards_output_and_cleans_up() {
        use std::os::unix::fs::PermissionsExt;

        let scratch = tempfile::tempdir().expect("scratch dir");
        let fake_ffmpeg = scratch.path().join("broken-ffmpeg.sh");
        std::fs::write(&fake_ffmpeg, "#!/bin/sh\necho 'decode error' >&2\nexit 1\n")
            .expect("write stub");
        std::fs::set_permissions(&fake_ffmpeg, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");

        let temp_root = scratch.path().join("work");
        std::fs::create_dir(&temp_root).expect("work dir");

        let transcoder = FfmpegTranscoder::default()
            .with_program(&fake_ffmpeg)
            .with_temp_root(&temp_root);

        let err = transcoder
            .to_canonical_wav(Bytes::from_static(b"OggSnotawavfile"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Failed(ref m) if m.contains("decode error")));

        let leftovers: Vec<_> = std::fs::read_dir(&temp_root)
            .expect("readable work dir")
            .collect();
        assert!(leftovers.is_empty(), "temp artifacts not cleaned up");
    }

    #[test]
    #[ignore]
    fn ffmpeg_transcode_smoke_ignored() {
        // Intentionally ignored: requires ffmpeg presence / download.
        // Kept to allow local manual verification of a real OGG -> WAV run.
    }
}
