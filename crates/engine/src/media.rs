use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sample rate every carried audio stream is resampled to before concatenation.
pub const REFERENCE_SAMPLE_RATE: u32 = 48000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resolution '{0}', expected WIDTHxHEIGHT")]
pub struct ResolutionParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Resolution { width, height }
    }

    /// Reduced width:height, e.g. 1920x1080 -> 16:9
    pub fn aspect_ratio(&self) -> String {
        let divisor = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / divisor, self.height / divisor)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ResolutionParseError(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(err)?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Resolution { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Rational frame rate as reported by ffprobe (`r_frame_rate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        FrameRate { num, den }
    }

    /// Parse "30/1", "30000/1001" or a bare integer like "25".
    pub fn parse(s: &str) -> Option<FrameRate> {
        let s = s.trim();
        match s.split_once('/') {
            Some((num, den)) => Some(FrameRate {
                num: num.trim().parse().ok()?,
                den: den.trim().parse().ok()?,
            }),
            None => Some(FrameRate {
                num: s.parse().ok()?,
                den: 1,
            }),
        }
    }

    /// Frames per second, or `None` when the rate is unknown (zero numerator or denominator).
    pub fn fps(&self) -> Option<f64> {
        if self.den == 0 || self.num == 0 {
            return None;
        }
        Some(self.num as f64 / self.den as f64)
    }

    pub fn is_known(&self) -> bool {
        self.fps().is_some()
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    pub codec: Option<String>,
    pub resolution: Option<Resolution>,
    pub frame_rate: Option<FrameRate>,
}

impl VideoStreamInfo {
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.and_then(|r| r.fps())
    }

    pub fn aspect_ratio(&self) -> Option<String> {
        self.resolution.map(|r| r.aspect_ratio())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioStreamInfo {
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
}

/// Container and first-stream metadata for one media file. Missing fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration_seconds: Option<f64>,
    pub size_bytes: Option<u64>,
    pub bitrate: Option<u64>,
    pub video: Option<VideoStreamInfo>,
    pub audio: Option<AudioStreamInfo>,
}

impl MediaInfo {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.video.as_ref().and_then(|v| v.resolution)
    }

    pub fn frame_rate(&self) -> Option<FrameRate> {
        self.video.as_ref().and_then(|v| v.frame_rate)
    }

    pub fn video_codec(&self) -> Option<&str> {
        self.video.as_ref().and_then(|v| v.codec.as_deref())
    }

    pub fn audio_codec(&self) -> Option<&str> {
        self.audio.as_ref().and_then(|a| a.codec.as_deref())
    }
}

pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `MM:SS`, or `HH:MM:SS` once the duration reaches an hour.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolution() {
        assert_eq!("1920x1080".parse::<Resolution>().unwrap(), Resolution::new(1920, 1080));
        assert_eq!("1280X720".parse::<Resolution>().unwrap(), Resolution::new(1280, 720));
        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x720".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }

    #[test]
    fn resolution_serializes_as_string() {
        let json = serde_json::to_string(&Resolution::new(640, 480)).unwrap();
        assert_eq!(json, "\"640x480\"");
        let back: Resolution = serde_json::from_str("\"640x480\"").unwrap();
        assert_eq!(back, Resolution::new(640, 480));
        assert!(serde_json::from_str::<Resolution>("\"wide\"").is_err());
    }

    #[test]
    fn aspect_ratio_is_reduced() {
        assert_eq!(Resolution::new(1920, 1080).aspect_ratio(), "16:9");
        assert_eq!(Resolution::new(720, 1280).aspect_ratio(), "9:16");
        assert_eq!(Resolution::new(640, 480).aspect_ratio(), "4:3");
    }

    #[test]
    fn frame_rate_zero_denominator_is_unknown() {
        let rate = FrameRate::parse("0/1").unwrap();
        assert_eq!(rate.fps(), None);
        let rate = FrameRate::parse("30/0").unwrap();
        assert_eq!(rate.fps(), None);
        assert!(!rate.is_known());
    }

    #[test]
    fn frame_rate_ntsc() {
        let rate = FrameRate::parse("30000/1001").unwrap();
        let fps = rate.fps().unwrap();
        assert!((fps - 29.97).abs() < 0.01);
        assert_eq!(rate.to_string(), "30000/1001");
        assert_eq!(FrameRate::parse("25").unwrap(), FrameRate::new(25, 1));
        assert!(FrameRate::parse("abc/1").is_none());
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_duration(75.4), "01:15");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
