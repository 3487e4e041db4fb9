pub mod catalog;
pub mod config;
pub mod error;
pub mod jobs;
pub mod media;
pub mod stitch;

pub use config::StitcherConfig;
pub use error::{Result, StitchError};
pub use stitch::{StitchResult, VideoStitcher};
