use thiserror::Error;

/// Errors that can occur while converting take files.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The file is too short for a wav header or its fixed tags are wrong.
    #[error("malformed wav header: {0}")]
    MalformedHeader(String),

    /// A spliced file did not come out at the expected size.
    #[error("spliced file is {actual} bytes, expected {expected}")]
    SpliceSizeMismatch { expected: u64, actual: u64 },

    /// A required argument or directory was missing or invalid.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
