//! Typed failure taxonomy for the submission pipeline.
//!
//! Every backend-originating failure is converted to one of these kinds at
//! the submission boundary and surfaced as a user-visible message. Nothing
//! in the core matches on error message text; classification happens once,
//! from the HTTP status code, in the streaming client.

use std::fmt;

/// Errors a single submission can surface to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No API key could be resolved; checked before any network call.
    MissingCredential,
    /// The backend rejected the request as malformed or unsupported
    /// (e.g. an image sent to a text-only model).
    BadRequest { detail: String },
    /// The backend does not know the requested model id.
    ModelNotFound { model: String },
    /// Quota exhausted; the user should try again later.
    RateLimited,
    /// The fragment stream failed mid-consumption; any partial output
    /// has been discarded.
    StreamFailure { detail: String },
    /// The capability table has no rows, so routing is impossible.
    EmptyCapabilityTable,
    /// The requested tutoring mode is not one of the registered ids.
    UnknownMode { input: String },
}

impl ChatError {
    /// Classify an HTTP error status from the completion backend.
    pub fn from_status(status: u16, model: &str, body_detail: String) -> Self {
        match status {
            400 => ChatError::BadRequest {
                detail: body_detail,
            },
            404 => ChatError::ModelNotFound {
                model: model.to_string(),
            },
            429 => ChatError::RateLimited,
            _ => ChatError::StreamFailure {
                detail: body_detail,
            },
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingCredential => {
                write!(
                    f,
                    "No API key available. Set one with `sugil auth` or the GEMINI_API_KEY environment variable."
                )
            }
            ChatError::BadRequest { detail } => {
                write!(
                    f,
                    "The model rejected this request: {detail}. Switching tiers may help."
                )
            }
            ChatError::ModelNotFound { model } => {
                write!(f, "The backend does not recognize the model '{model}'.")
            }
            ChatError::RateLimited => {
                write!(f, "Quota exhausted. Please try again later.")
            }
            ChatError::StreamFailure { detail } => {
                write!(f, "The response stream failed: {detail}")
            }
            ChatError::EmptyCapabilityTable => {
                write!(f, "No models are configured; cannot route the request.")
            }
            ChatError::UnknownMode { input } => {
                write!(
                    f,
                    "Unknown tutoring mode '{input}'. Available modes: solver, hint-coach, concept-coach"
                )
            }
        }
    }
}

impl std::error::Error for ChatError {}
