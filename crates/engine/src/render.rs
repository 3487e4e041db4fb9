use crate::compiler::{ClipAudio, EncoderSettings, NormalizePlan, SimplePlan};
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub struct RenderCommand {
    pub ffmpeg_args: Vec<String>,
    pub output_path: PathBuf,
}

/// Concat demuxer list: one `file '<path>'` line per input, single quotes escaped.
pub fn concat_manifest(inputs: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for input in inputs {
        let escaped = input.to_string_lossy().replace('\'', r"'\''");
        let _ = writeln!(manifest, "file '{}'", escaped);
    }
    manifest
}

/// Concat-demuxer join of the inputs listed in `manifest_path`. No filters are applied.
pub fn generate_simple_command(
    plan: &SimplePlan,
    manifest_path: &Path,
    output_path: PathBuf,
) -> RenderCommand {
    let mut args = base_args();
    args.extend(["-f", "concat", "-safe", "0", "-i"].map(String::from));
    args.push(manifest_path.to_string_lossy().to_string());
    push_video_encoder(&mut args, &plan.encoder);
    args.push("-c:a".to_string());
    args.push(plan.encoder.audio_codec.clone());
    push_output(&mut args, &output_path);

    RenderCommand {
        ffmpeg_args: args,
        output_path,
    }
}

/// The `-filter_complex` graph for a normalization plan.
///
/// `[0:v:0]scale=640:480,setsar=1,fps=30/1[v0];[0:a:0]aresample=48000,...[a0];...;[v0][a0]...concat=n=N:v=1:a=1[outv][outa]`
pub fn filter_graph(plan: &NormalizePlan) -> String {
    let mut parts = Vec::with_capacity(plan.clips.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for (idx, clip) in plan.clips.iter().enumerate() {
        parts.push(format!(
            "[{idx}:v:0]scale={w}:{h},setsar=1,fps={rate}[v{idx}]",
            w = plan.resolution.width,
            h = plan.resolution.height,
            rate = plan.frame_rate,
        ));
        let _ = write!(concat_inputs, "[v{idx}]");

        match &clip.audio {
            ClipAudio::Dropped => {}
            ClipAudio::Resample { sample_rate } => {
                parts.push(format!(
                    "[{idx}:a:0]aresample={sample_rate},{}[a{idx}]",
                    audio_format()
                ));
                let _ = write!(concat_inputs, "[a{idx}]");
            }
            ClipAudio::Silence {
                sample_rate,
                duration_seconds,
            } => {
                parts.push(format!(
                    "anullsrc=r={sample_rate}:cl=stereo,atrim=duration={duration_seconds:.6},{}[a{idx}]",
                    audio_format()
                ));
                let _ = write!(concat_inputs, "[a{idx}]");
            }
        }
    }

    if plan.carry_audio {
        parts.push(format!(
            "{concat_inputs}concat=n={}:v=1:a=1[outv][outa]",
            plan.clips.len()
        ));
    } else {
        parts.push(format!(
            "{concat_inputs}concat=n={}:v=1:a=0[outv]",
            plan.clips.len()
        ));
    }

    parts.join(";")
}

// concat needs identical audio formats on every segment
fn audio_format() -> &'static str {
    "aformat=sample_fmts=fltp:channel_layouts=stereo"
}

pub fn generate_normalize_command(plan: &NormalizePlan, output_path: PathBuf) -> RenderCommand {
    let mut args = base_args();
    for clip in &plan.clips {
        args.push("-i".to_string());
        args.push(clip.input.to_string_lossy().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(filter_graph(plan));
    args.push("-map".to_string());
    args.push("[outv]".to_string());

    push_video_encoder(&mut args, &plan.encoder);
    if plan.carry_audio {
        args.push("-map".to_string());
        args.push("[outa]".to_string());
        args.push("-c:a".to_string());
        args.push(plan.encoder.audio_codec.clone());
    } else {
        args.push("-an".to_string());
    }
    push_output(&mut args, &output_path);

    RenderCommand {
        ffmpeg_args: args,
        output_path,
    }
}

fn base_args() -> Vec<String> {
    ["-hide_banner", "-nostdin", "-loglevel", "error"]
        .map(String::from)
        .to_vec()
}

fn push_video_encoder(args: &mut Vec<String>, encoder: &EncoderSettings) {
    args.push("-c:v".to_string());
    args.push(encoder.video_codec.clone());
    args.push("-preset".to_string());
    args.push(encoder.preset.clone());
}

fn push_output(args: &mut Vec<String>, output_path: &Path) {
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());
    args.push("-y".to_string());
    args.push(output_path.to_string_lossy().to_string());
}
