use engine::compiler::CompileError;
use engine::request::RequestError;
use engine::ResolutionParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The external tool failed; `stderr` is its raw diagnostic output.
    #[error("processing failed: {message}")]
    ProcessingFailed { message: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StitchError>;

impl StitchError {
    pub fn processing(message: impl Into<String>) -> Self {
        StitchError::ProcessingFailed {
            message: message.into(),
            stderr: String::new(),
        }
    }

    /// HTTP-equivalent status for the request layer.
    pub fn status_code(&self) -> u16 {
        match self {
            StitchError::InvalidArgument(_) => 400,
            StitchError::NotFound(_) => 404,
            StitchError::ProcessingFailed { .. } | StitchError::Io(_) => 500,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            StitchError::ProcessingFailed { stderr, .. } if !stderr.is_empty() => Some(stderr.as_str()),
            _ => None,
        }
    }
}

impl From<RequestError> for StitchError {
    fn from(err: RequestError) -> Self {
        StitchError::InvalidArgument(err.to_string())
    }
}

impl From<CompileError> for StitchError {
    fn from(err: CompileError) -> Self {
        StitchError::InvalidArgument(err.to_string())
    }
}

impl From<ResolutionParseError> for StitchError {
    fn from(err: ResolutionParseError) -> Self {
        StitchError::InvalidArgument(err.to_string())
    }
}
