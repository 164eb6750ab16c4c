use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrustError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Missing capability: {0}")]
    Capability(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type TrustResult<T> = Result<T, TrustError>;
