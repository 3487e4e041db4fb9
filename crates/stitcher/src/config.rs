use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "videos";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_FFPROBE: &str = "ffprobe";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StitcherConfig {
    /// Directory stitched videos are written to.
    pub output_dir: PathBuf,
    /// Directory for concat manifests.
    pub temp_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for StitcherConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            temp_dir: std::env::temp_dir(),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE),
        }
    }
}

impl StitcherConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_ffprobe(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StitcherConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("videos"));
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.temp_dir, std::env::temp_dir());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StitcherConfig =
            serde_json::from_str(r#"{ "output_dir": "/srv/stitched" }"#).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/srv/stitched"));
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
    }
}
