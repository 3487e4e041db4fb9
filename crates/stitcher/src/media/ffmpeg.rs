use engine::probe::parse_probe_output;
use engine::MediaInfo;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::StitcherConfig;
use crate::error::{Result, StitchError};

/// Thin wrapper over the `ffmpeg` and `ffprobe` binaries.
///
/// Children are spawned with `kill_on_drop`, so dropping an in-flight future
/// (a caller-side timeout) terminates the process.
#[derive(Debug, Clone)]
pub struct FFmpegWrapper {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FFmpegWrapper {
    pub fn new(config: &StitcherConfig) -> Self {
        FFmpegWrapper {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
        }
    }

    /// Container and stream metadata for `media_path`.
    ///
    /// A missing file, or one ffprobe cannot read, is `NotFound`. Fields ffprobe
    /// does report but in an unexpected form are left empty.
    pub async fn probe(&self, media_path: &Path) -> Result<MediaInfo> {
        let file_meta = match tokio::fs::metadata(media_path).await {
            Ok(meta) if meta.is_file() => meta,
            _ => return Err(StitchError::NotFound(media_path.to_path_buf())),
        };

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(media_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                StitchError::processing(format!(
                    "failed to execute {}: {}. Make sure FFmpeg is installed.",
                    self.ffprobe.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("ffprobe could not read {}: {}", media_path.display(), stderr.trim());
            return Err(StitchError::NotFound(media_path.to_path_buf()));
        }

        let mut info = parse_probe_output(&output.stdout).map_err(|e| {
            warn!("{} for {}", e, media_path.display());
            StitchError::NotFound(media_path.to_path_buf())
        })?;

        if info.size_bytes.is_none() {
            info.size_bytes = Some(file_meta.len());
        }

        debug!("Probed {}: {:?}", media_path.display(), info);
        Ok(info)
    }

    /// Run ffmpeg to completion. A non-zero exit carries ffmpeg's stderr.
    pub async fn run(&self, args: &[String]) -> Result<()> {
        debug!("{} {}", self.ffmpeg.display(), args.join(" "));

        let output = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                StitchError::processing(format!(
                    "failed to execute {}: {}. Make sure FFmpeg is installed.",
                    self.ffmpeg.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StitchError::ProcessingFailed {
                message: format!("ffmpeg exited with {}", output.status),
                stderr,
            });
        }

        Ok(())
    }
}
