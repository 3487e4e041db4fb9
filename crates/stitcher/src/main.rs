use clap::{ArgAction, Parser, Subcommand};
use engine::{format_duration, format_file_size, Resolution, StitchRequest};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use stitcher::{StitcherConfig, VideoStitcher};

#[derive(Parser)]
#[command(name = "stitcher", version, about = "Stitch generated clips into one video with FFmpeg")]
struct Cli {
    /// -v for debug output (shows rendered ffmpeg commands), -vv for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, env = "STITCHER_OUTPUT_DIR", default_value = "videos", global = true)]
    output_dir: PathBuf,

    /// Directory for concat manifests [default: system temp dir]
    #[arg(long, env = "STITCHER_TEMP_DIR", global = true)]
    temp_dir: Option<PathBuf>,

    #[arg(long, env = "STITCHER_FFMPEG", default_value = "ffmpeg", global = true)]
    ffmpeg: PathBuf,

    #[arg(long, env = "STITCHER_FFPROBE", default_value = "ffprobe", global = true)]
    ffprobe: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Concatenate videos in the order given
    Stitch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Join with the concat demuxer only; inputs must share codec, resolution and frame rate
        #[arg(long)]
        no_normalize: bool,

        /// Target resolution, e.g. 1280x720 [default: first input's]
        #[arg(long)]
        resolution: Option<Resolution>,

        /// Output filename inside the output directory [default: stitched_<id>.mp4]
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long, default_value = engine::DEFAULT_VIDEO_CODEC)]
        video_codec: String,

        #[arg(long, default_value = engine::DEFAULT_AUDIO_CODEC)]
        audio_codec: String,

        #[arg(long, default_value = engine::DEFAULT_PRESET)]
        preset: String,
    },
    /// Print container and stream metadata for a video
    Probe { file: PathBuf },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = StitcherConfig::default()
        .with_output_dir(cli.output_dir)
        .with_ffmpeg(cli.ffmpeg)
        .with_ffprobe(cli.ffprobe);
    if let Some(temp_dir) = cli.temp_dir {
        config = config.with_temp_dir(temp_dir);
    }
    let stitcher = VideoStitcher::new(config)?;

    match cli.command {
        Command::Stitch {
            inputs,
            no_normalize,
            resolution,
            output,
            video_codec,
            audio_codec,
            preset,
        } => {
            let request = StitchRequest {
                inputs,
                output_filename: output,
                normalize: !no_normalize,
                target_resolution: resolution,
                video_codec,
                audio_codec,
                preset,
            };
            let result = stitcher.stitch(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Probe { file } => {
            let info = stitcher.ffmpeg().probe(&file).await?;
            let video = info.video.as_ref();
            let summary = serde_json::json!({
                "duration_seconds": info.duration_seconds,
                "duration": info.duration_seconds.map(format_duration),
                "size_bytes": info.size_bytes,
                "size": info.size_bytes.map(format_file_size),
                "bitrate": info.bitrate,
                "resolution": info.resolution().map(|r| r.to_string()),
                "aspect_ratio": video.and_then(|v| v.aspect_ratio()),
                "codec": info.video_codec(),
                "fps": video.and_then(|v| v.fps()).map(|f| (f * 100.0).round() / 100.0),
                "audio_codec": info.audio_codec(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
