use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("unknown tightness: {0}")]
    UnknownTightness(String),
}
