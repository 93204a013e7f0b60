//! Error types for vibe-core.
//!
//! The domain has almost no failure surface: inputs are compile-time
//! constants or internally generated samples. What remains is load-time
//! validation (catalog, config) and refused screen transitions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VibeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid catalog entry '{title}': {reason}")]
    InvalidCatalog { title: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot {action} from the {from} screen")]
    InvalidTransition { from: &'static str, action: &'static str },

    #[error("cancel is not available while {phase}")]
    CancelUnavailable { phase: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VibeError>;
