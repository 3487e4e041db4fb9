//! Parsing of `ffprobe -print_format json -show_format -show_streams` output.
//!
//! Only an unparseable document is an error. Individual fields that are
//! missing or carry an unexpected type come back as `None`, since callers use
//! this for best-effort cataloging.

use crate::media::{AudioStreamInfo, FrameRate, MediaInfo, Resolution, VideoStreamInfo};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("failed to parse ffprobe output: {0}")]
pub struct ProbeParseError(#[from] serde_json::Error);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<FormatInfo>,
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<Value>,
    size: Option<Value>,
    bit_rate: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<Value>,
    height: Option<Value>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<Value>,
}

pub fn parse_probe_output(bytes: &[u8]) -> Result<MediaInfo, ProbeParseError> {
    let probe: ProbeOutput = serde_json::from_slice(bytes)?;

    let (duration_seconds, size_bytes, bitrate) = match &probe.format {
        Some(format) => (
            format.duration.as_ref().and_then(as_f64),
            format.size.as_ref().and_then(as_u64),
            format.bit_rate.as_ref().and_then(as_u64),
        ),
        None => (None, None, None),
    };

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|vs| {
            let width = vs.width.as_ref().and_then(as_u64);
            let height = vs.height.as_ref().and_then(as_u64);
            let resolution = match (width, height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => {
                    match (u32::try_from(w), u32::try_from(h)) {
                        (Ok(w), Ok(h)) => Some(Resolution::new(w, h)),
                        _ => None,
                    }
                }
                _ => None,
            };

            // A known r_frame_rate wins, then a known avg_frame_rate. ffprobe
            // reports "0/0" for r_frame_rate on some streams with a valid average.
            let r_rate = vs.r_frame_rate.as_deref().and_then(FrameRate::parse);
            let avg_rate = vs.avg_frame_rate.as_deref().and_then(FrameRate::parse);
            let frame_rate = r_rate
                .filter(FrameRate::is_known)
                .or_else(|| avg_rate.filter(FrameRate::is_known))
                .or(r_rate)
                .or(avg_rate);

            VideoStreamInfo {
                codec: vs.codec_name.clone(),
                resolution,
                frame_rate,
            }
        });

    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|a| AudioStreamInfo {
            codec: a.codec_name.clone(),
            sample_rate: a.sample_rate.as_ref().and_then(as_u64).and_then(|r| u32::try_from(r).ok()),
        });

    Ok(MediaInfo {
        duration_seconds,
        size_bytes,
        bitrate,
        video,
        audio,
    })
}

// ffprobe reports most numbers as JSON strings ("12.345000"), dimensions as numbers.
fn as_f64(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "44100",
                "channels": 2
            }
        ],
        "format": {
            "filename": "clip.mp4",
            "duration": "8.008000",
            "size": "2345678",
            "bit_rate": "2343000"
        }
    }"#;

    #[test]
    fn parses_full_probe() {
        let info = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.duration_seconds, Some(8.008));
        assert_eq!(info.size_bytes, Some(2345678));
        assert_eq!(info.bitrate, Some(2343000));
        assert_eq!(info.resolution(), Some(Resolution::new(1920, 1080)));
        assert_eq!(info.frame_rate(), Some(FrameRate::new(30000, 1001)));
        assert_eq!(info.video_codec(), Some("h264"));
        assert_eq!(info.audio_codec(), Some("aac"));
        assert_eq!(info.audio.as_ref().unwrap().sample_rate, Some(44100));
        assert_eq!(info.video.as_ref().unwrap().aspect_ratio().as_deref(), Some("16:9"));
        assert!(info.has_audio());
    }

    #[test]
    fn malformed_fields_degrade_to_none() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "width": "wide", "r_frame_rate": "0/0" }
            ],
            "format": { "duration": "N/A" }
        }"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(info.duration_seconds, None);
        assert_eq!(info.resolution(), None);
        assert_eq!(info.video_codec(), None);
        assert_eq!(info.video.as_ref().unwrap().fps(), None);
        assert!(!info.has_audio());
    }

    #[test]
    fn zero_frame_rate_reports_unknown_fps() {
        let json = r#"{ "streams": [ { "codec_type": "video", "r_frame_rate": "0/1" } ] }"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(info.frame_rate(), Some(FrameRate::new(0, 1)));
        assert_eq!(info.video.unwrap().fps(), None);
    }

    #[test]
    fn unknown_r_frame_rate_falls_back_to_average() {
        let json = r#"{ "streams": [
            { "codec_type": "video", "r_frame_rate": "0/0", "avg_frame_rate": "30/1" }
        ] }"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(info.frame_rate(), Some(FrameRate::new(30, 1)));
        assert_eq!(info.video.unwrap().fps(), Some(30.0));
    }

    #[test]
    fn out_of_range_numbers_degrade_to_none() {
        let json = r#"{ "streams": [
            { "codec_type": "video", "width": 4294967296, "height": 1080 },
            { "codec_type": "audio", "sample_rate": "4294967296" }
        ] }"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(info.resolution(), None);
        assert_eq!(info.audio.unwrap().sample_rate, None);
    }

    #[test]
    fn empty_document_has_no_streams() {
        let info = parse_probe_output(b"{}").unwrap();
        assert_eq!(info, MediaInfo::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_probe_output(b"not json").is_err());
    }
}
