//! Error types for stepscope

use thiserror::Error;

/// Main error type for stepscope operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Format(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Renderer busy: {0}")]
    Busy(&'static str),
}

/// Result type alias for stepscope operations
pub type Result<T> = std::result::Result<T, Error>;
