use thiserror::Error;

pub type Result<T> = std::result::Result<T, CharterError>;

#[derive(Debug, Error)]
pub enum CharterError {
    #[error("failed to read WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("invalid chart JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The background analysis thread panicked or hung up without replying.
    #[error("analysis worker failed: {0}")]
    WorkerFailure(String),
}
