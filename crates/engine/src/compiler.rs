use crate::media::{FrameRate, MediaInfo, Resolution, REFERENCE_SAMPLE_RATE};
use crate::request::StitchRequest;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("first input has no usable video stream to take the resolution from")]
    NoReferenceResolution,
    #[error("first input has no known frame rate")]
    UnknownFrameRate,
    #[error("input {index} has neither an audio stream nor a known duration")]
    UnknownClipDuration { index: usize },
    #[error("expected {expected} probe results, got {actual}")]
    ProbeCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
}

impl From<&StitchRequest> for EncoderSettings {
    fn from(req: &StitchRequest) -> Self {
        EncoderSettings {
            video_codec: req.video_codec.clone(),
            audio_codec: req.audio_codec.clone(),
            preset: req.preset.clone(),
        }
    }
}

/// Concat-demuxer join. Inputs must already share codec, resolution and frame rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePlan {
    pub inputs: Vec<PathBuf>,
    pub encoder: EncoderSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipAudio {
    /// The batch carries no audio.
    Dropped,
    /// Use the clip's first audio stream, resampled.
    Resample { sample_rate: u32 },
    /// The clip has no audio but the batch does: fill with silence of the clip's length.
    Silence { sample_rate: u32, duration_seconds: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    pub input: PathBuf,
    pub audio: ClipAudio,
}

/// Filter-graph join: every clip is scaled, given square pixels and retimed before concat.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizePlan {
    pub clips: Vec<ClipPlan>,
    pub resolution: Resolution,
    pub frame_rate: FrameRate,
    pub carry_audio: bool,
    pub encoder: EncoderSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StitchPlan {
    Simple(SimplePlan),
    Normalize(NormalizePlan),
}

pub fn compile_simple(request: &StitchRequest) -> SimplePlan {
    SimplePlan {
        inputs: request.inputs.clone(),
        encoder: EncoderSettings::from(request),
    }
}

/// Build the normalization plan from one probe per input, in input order.
///
/// The first input is the reference: its frame rate always, its resolution
/// unless the request names one, and its audio presence decides whether the
/// output carries audio at all.
pub fn compile_normalized(
    request: &StitchRequest,
    probes: &[MediaInfo],
) -> Result<NormalizePlan, CompileError> {
    if probes.len() != request.inputs.len() {
        return Err(CompileError::ProbeCountMismatch {
            expected: request.inputs.len(),
            actual: probes.len(),
        });
    }
    let reference = probes.first().ok_or(CompileError::NoReferenceResolution)?;

    let resolution = match request.target_resolution {
        Some(target) => target,
        None => reference
            .resolution()
            .ok_or(CompileError::NoReferenceResolution)?,
    };

    let frame_rate = reference
        .frame_rate()
        .filter(FrameRate::is_known)
        .ok_or(CompileError::UnknownFrameRate)?;

    let carry_audio = reference.has_audio();

    let clips = request
        .inputs
        .iter()
        .zip(probes)
        .enumerate()
        .map(|(index, (input, probe))| -> Result<ClipPlan, CompileError> {
            let audio = if !carry_audio {
                ClipAudio::Dropped
            } else if probe.has_audio() {
                ClipAudio::Resample {
                    sample_rate: REFERENCE_SAMPLE_RATE,
                }
            } else {
                let duration_seconds = probe
                    .duration_seconds
                    .filter(|d| *d > 0.0)
                    .ok_or(CompileError::UnknownClipDuration { index })?;
                ClipAudio::Silence {
                    sample_rate: REFERENCE_SAMPLE_RATE,
                    duration_seconds,
                }
            };
            Ok(ClipPlan {
                input: input.clone(),
                audio,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(NormalizePlan {
        clips,
        resolution,
        frame_rate,
        carry_audio,
        encoder: EncoderSettings::from(request),
    })
}
