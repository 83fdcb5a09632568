//! @acp:module "Errors"
//! @acp:summary "Library error type and result alias"
//! @acp:domain engine
//! @acp:layer model

use thiserror::Error;

/// Errors raised by the engine itself: I/O, bad configuration, defects.
///
/// Malformed *input data* (comments, declaration sources, variable names)
/// never travels through this type; those conditions become diagnostics or
/// tagged [`ResolveError`](crate::vars::ResolveError) values.
#[derive(Debug, Error)]
pub enum AcpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, AcpError>;
