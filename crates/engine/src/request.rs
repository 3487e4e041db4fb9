use crate::media::Resolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const MAX_INPUTS: usize = 100;

pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
pub const DEFAULT_PRESET: &str = "medium";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("at least one input video required")]
    NoInputs,
    #[error("too many input videos (max 100, got {0})")]
    TooManyInputs(usize),
    #[error("invalid output filename '{0}'")]
    InvalidOutputFilename(String),
    #[error("{0} must not be empty")]
    EmptyEncoderOption(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchRequest {
    /// Input files in timeline order.
    pub inputs: Vec<PathBuf>,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default)]
    pub target_resolution: Option<Resolution>,
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_normalize() -> bool {
    true
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

impl StitchRequest {
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        StitchRequest {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output_filename: None,
            normalize: true,
            target_resolution: None,
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
        }
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn target_resolution(mut self, resolution: Resolution) -> Self {
        self.target_resolution = Some(resolution);
        self
    }

    pub fn output_filename(mut self, filename: impl Into<String>) -> Self {
        self.output_filename = Some(filename.into());
        self
    }

    /// Shape checks that need no filesystem access.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.inputs.is_empty() {
            return Err(RequestError::NoInputs);
        }
        if self.inputs.len() > MAX_INPUTS {
            return Err(RequestError::TooManyInputs(self.inputs.len()));
        }
        if let Some(name) = &self.output_filename {
            validate_output_filename(name)?;
        }
        if self.video_codec.trim().is_empty() {
            return Err(RequestError::EmptyEncoderOption("video codec"));
        }
        if self.audio_codec.trim().is_empty() {
            return Err(RequestError::EmptyEncoderOption("audio codec"));
        }
        if self.preset.trim().is_empty() {
            return Err(RequestError::EmptyEncoderOption("preset"));
        }
        Ok(())
    }
}

// Output names are joined onto the output directory, so they must stay a single
// visible component. A trailing dot leaves ffmpeg with no container to infer.
fn validate_output_filename(name: &str) -> Result<(), RequestError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.ends_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(RequestError::InvalidOutputFilename(name.to_string()));
    }
    Ok(())
}
