//! Collaborator error taxonomy

use thiserror::Error;

use super::response::ParseError;

/// Errors from the AI collaborator
///
/// All of these fail the whole invocation; nothing is persisted before the
/// call succeeds, so previously stored state stays untouched.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("API error ({status_code:?}): {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Invalid response from model: {message}")]
    InvalidResponse { message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}
