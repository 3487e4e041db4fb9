use engine::compiler::{compile_normalized, compile_simple, NormalizePlan, SimplePlan, StitchPlan};
use engine::render::{concat_manifest, generate_normalize_command, generate_simple_command};
use engine::{MediaInfo, StitchRequest};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::StitcherConfig;
use crate::error::{Result, StitchError};
use crate::media::ffmpeg::FFmpegWrapper;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchResult {
    pub output_path: PathBuf,
    pub filename: String,
    /// Seconds.
    pub duration: f64,
    /// Bytes.
    pub size: u64,
    pub resolution: String,
    pub codec: String,
    pub input_count: usize,
}

/// Joins clips into one video with ffmpeg.
///
/// Holds no per-call state; concurrent `stitch` calls are independent and each
/// writes its own uniquely named file into the output directory.
#[derive(Debug, Clone)]
pub struct VideoStitcher {
    config: StitcherConfig,
    ffmpeg: FFmpegWrapper,
}

impl VideoStitcher {
    pub fn new(config: StitcherConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;
        let ffmpeg = FFmpegWrapper::new(&config);
        Ok(VideoStitcher { config, ffmpeg })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn ffmpeg(&self) -> &FFmpegWrapper {
        &self.ffmpeg
    }

    /// Stitch `request.inputs` in order into one file in the output directory.
    ///
    /// With `normalize` off the inputs go through the concat demuxer as-is and
    /// must already share codec, resolution and frame rate; mixed inputs fail
    /// or produce a broken file. With `normalize` on every clip is scaled and
    /// retimed to the first input (or the requested resolution).
    ///
    /// The final filename only appears once ffmpeg succeeded and the result
    /// probed; on every failure path the manifest and the partial file are gone.
    pub async fn stitch(&self, request: &StitchRequest) -> Result<StitchResult> {
        match self.stitch_inner(request).await {
            Ok(result) => {
                info!("Successfully stitched video: {}", result.output_path.display());
                Ok(result)
            }
            Err(err) => {
                match err.stderr() {
                    Some(stderr) => error!("FFmpeg error during stitching: {}: {}", err, stderr),
                    None => error!("Error during video stitching: {}", err),
                }
                Err(err)
            }
        }
    }

    async fn stitch_inner(&self, request: &StitchRequest) -> Result<StitchResult> {
        request.validate()?;

        for input in &request.inputs {
            if !tokio::fs::metadata(input).await.map(|m| m.is_file()).unwrap_or(false) {
                return Err(StitchError::NotFound(input.clone()));
            }
        }

        info!("Stitching {} videos together", request.inputs.len());

        let plan = if request.normalize {
            StitchPlan::Normalize(self.plan_normalized(request).await?)
        } else {
            StitchPlan::Simple(self.plan_simple(request).await?)
        };

        let filename = self.resolve_output_filename(request);
        let output_path = self.config.output_dir.join(&filename);
        let partial = PartialOutput::new(&self.config.output_dir, &filename);

        match &plan {
            StitchPlan::Simple(plan) => self.run_simple(plan, partial.path()).await?,
            StitchPlan::Normalize(plan) => self.run_normalized(plan, partial.path()).await?,
        }

        let info = self.ffmpeg.probe(partial.path()).await.map_err(|e| StitchError::ProcessingFailed {
            message: "stitched output could not be probed".to_string(),
            stderr: e.to_string(),
        })?;
        let result = assemble_result(&info, &output_path, &filename, request.inputs.len())?;

        partial.commit(&output_path)?;
        Ok(result)
    }

    async fn plan_simple(&self, request: &StitchRequest) -> Result<SimplePlan> {
        let mut plan = compile_simple(request);
        // the concat demuxer resolves relative entries against the manifest's directory
        for input in plan.inputs.iter_mut() {
            *input = tokio::fs::canonicalize(&*input)
                .await
                .map_err(|_| StitchError::NotFound(input.clone()))?;
        }
        Ok(plan)
    }

    async fn plan_normalized(&self, request: &StitchRequest) -> Result<NormalizePlan> {
        let mut probes: Vec<MediaInfo> = Vec::with_capacity(request.inputs.len());
        for input in &request.inputs {
            probes.push(self.ffmpeg.probe(input).await?);
        }
        let plan = compile_normalized(request, &probes)?;

        info!(
            "Normalizing to {} @ {} fps (audio: {})",
            plan.resolution,
            plan.frame_rate
                .fps()
                .map(|f| format!("{:.3}", f))
                .unwrap_or_else(|| plan.frame_rate.to_string()),
            plan.carry_audio
        );
        Ok(plan)
    }

    async fn run_simple(&self, plan: &SimplePlan, output_path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        // Removed when dropped, whichever way this function returns.
        let mut manifest = tempfile::Builder::new()
            .prefix("concat_")
            .suffix(".txt")
            .tempfile_in(&self.config.temp_dir)?;
        manifest.write_all(concat_manifest(&plan.inputs).as_bytes())?;
        manifest.flush()?;

        let cmd = generate_simple_command(plan, manifest.path(), output_path.to_path_buf());
        self.ffmpeg.run(&cmd.ffmpeg_args).await
    }

    async fn run_normalized(&self, plan: &NormalizePlan, output_path: &Path) -> Result<()> {
        let cmd = generate_normalize_command(plan, output_path.to_path_buf());
        self.ffmpeg.run(&cmd.ffmpeg_args).await
    }

    fn resolve_output_filename(&self, request: &StitchRequest) -> String {
        match &request.output_filename {
            Some(name) if Path::new(name).extension().is_some() => name.clone(),
            Some(name) => format!("{}.mp4", name),
            None => loop {
                let candidate = format!("stitched_{}.mp4", &Uuid::new_v4().simple().to_string()[..8]);
                if !self.config.output_dir.join(&candidate).exists() {
                    break candidate;
                }
            },
        }
    }
}

fn assemble_result(
    info: &MediaInfo,
    output_path: &Path,
    filename: &str,
    input_count: usize,
) -> Result<StitchResult> {
    let incomplete = |what: &str| StitchError::processing(format!("stitched output has no {}", what));

    Ok(StitchResult {
        output_path: output_path.to_path_buf(),
        filename: filename.to_string(),
        duration: info.duration_seconds.ok_or_else(|| incomplete("duration"))?,
        size: info.size_bytes.ok_or_else(|| incomplete("size"))?,
        resolution: info
            .resolution()
            .ok_or_else(|| incomplete("video resolution"))?
            .to_string(),
        codec: info
            .video_codec()
            .ok_or_else(|| incomplete("video codec"))?
            .to_string(),
        input_count,
    })
}

/// Hidden sibling of the final output that ffmpeg writes into. Deleted on drop
/// unless committed, so a failed or cancelled stitch leaves nothing behind.
struct PartialOutput {
    path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    fn new(dir: &Path, filename: &str) -> Self {
        // keep the real filename last so ffmpeg still picks the container from the extension
        let id = Uuid::new_v4().simple().to_string();
        PartialOutput {
            path: dir.join(format!(".partial-{}-{}", &id[..8], filename)),
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self, destination: &Path) -> Result<()> {
        std::fs::rename(&self.path, destination)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
