//! Error types for media resolution.

use thiserror::Error;

use crate::api::ApiError;
use crate::error::ErrorKind;
use crate::platform::ValidationError;

/// Errors that can occur while resolving a URL into metadata and formats.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input was rejected locally; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The extraction service rejected or failed the lookup.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ResolveError {
    /// Flat classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Api(error) => error.kind(),
        }
    }

    /// Short message suitable for direct display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(error) => error.to_string(),
            Self::Api(error) => error.user_message(),
        }
    }
}
