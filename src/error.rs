use thiserror::Error;

/// Errors surfaced by the detector and its collaborators.
#[derive(Debug, Error)]
pub enum CopodError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("index {index} out of range for {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("detector has not been fitted")]
    NotFitted,

    #[error("checkpoint serialization failed: {0}")]
    SerializationFailed(String),

    #[error("checkpoint deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("unsupported checkpoint version: {found} (max supported: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },

    #[error("checkpoint checksum mismatch: expected {expected:#018x}, found {found:#018x}")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CopodError>;
