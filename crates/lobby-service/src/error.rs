//! Error types for the Lobby service.

use lobby_match::MatchError;
use thiserror::Error;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid or unparsable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Matching core rejected the cycle or a team attempt
    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    /// Seed file is not valid JSON
    #[error("Seed file error: {0}")]
    Seed(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
