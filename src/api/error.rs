//! Error types for calls against the extraction service.
//!
//! Status codes are mapped once, in [`ApiError::from_status`], so every
//! caller sees the same classification.

use reqwest::StatusCode;
use thiserror::Error;

use crate::error::ErrorKind;

const DEFAULT_ACCESS_RESTRICTED_MESSAGE: &str =
    "This video may be private or age restricted. Add cookies.txt to the backend.";
const DEFAULT_STORAGE_MESSAGE: &str = "Insufficient disk space";

/// Which kind of call produced a response; selects default messages and
/// how a 404 is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Metadata or format lookup.
    Lookup,
    /// Job creation.
    Submission,
    /// Health polling or platform detection.
    Service,
}

impl RequestPhase {
    fn default_message(self) -> &'static str {
        match self {
            Self::Lookup => "Failed to fetch video information",
            Self::Submission => "Download failed",
            Self::Service => "Service request failed",
        }
    }
}

/// Errors returned by [`super::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote reported that the URL has no resolvable media.
    #[error("media not found: {message}")]
    NotFound {
        /// Server-provided message.
        message: String,
    },

    /// The content requires credentials the backend does not have.
    #[error("access restricted: {message}\n  Suggestion: Add a valid cookies file to the backend")]
    AccessRestricted {
        /// Server-provided or default message.
        message: String,
    },

    /// The backend has no room to produce the artifact (HTTP 507).
    #[error("insufficient storage on server: {message}")]
    InsufficientStorage {
        /// Server-provided or default message.
        message: String,
    },

    /// The route does not exist on this backend.
    #[error("{message}")]
    UnsupportedOperation {
        /// Route that was called.
        route: String,
        /// Message to show verbatim.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("HTTP {status} from {route}: {message}")]
    Remote {
        /// Route that was called.
        route: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided or default message.
        message: String,
    },

    /// Transport failure (DNS, connect, TLS, timeout, reset).
    #[error("network error calling {route}: {source}")]
    Network {
        /// Route that was called.
        route: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("invalid response from {route}: {reason}")]
    InvalidResponse {
        /// Route that was called.
        route: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The configured base URL is unusable.
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },
}

impl ApiError {
    /// Maps a non-success status and optional server message to an error.
    ///
    /// - 404: `UnsupportedOperation`, unless a lookup carries a server message
    ///   (the route exists and reported no media), which is `NotFound`.
    /// - 403: `AccessRestricted`
    /// - 507: `InsufficientStorage`
    /// - anything else: `Remote`
    #[must_use]
    pub fn from_status(
        route: &str,
        status: StatusCode,
        server_message: Option<String>,
        phase: RequestPhase,
    ) -> Self {
        match status.as_u16() {
            404 => match (phase, server_message) {
                (RequestPhase::Lookup, Some(message)) => Self::NotFound { message },
                _ => Self::UnsupportedOperation {
                    route: route.to_string(),
                    message: format!(
                        "404 Not Found: Backend route {route} does not exist. Add it to server."
                    ),
                },
            },
            403 => Self::AccessRestricted {
                message: server_message
                    .unwrap_or_else(|| DEFAULT_ACCESS_RESTRICTED_MESSAGE.to_string()),
            },
            507 => Self::InsufficientStorage {
                message: server_message.unwrap_or_else(|| DEFAULT_STORAGE_MESSAGE.to_string()),
            },
            code => Self::Remote {
                route: route.to_string(),
                status: code,
                message: server_message.unwrap_or_else(|| phase.default_message().to_string()),
            },
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(route: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            route: route.into(),
            source,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(route: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            route: route.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-base-URL error.
    pub fn invalid_base_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Flat classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AccessRestricted { .. } => ErrorKind::AccessRestricted,
            Self::InsufficientStorage { .. } => ErrorKind::InsufficientStorage,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::Remote { .. } | Self::InvalidResponse { .. } => ErrorKind::Remote,
            Self::Network { .. } => ErrorKind::Network,
            Self::InvalidBaseUrl { .. } | Self::ClientBuild { .. } => ErrorKind::Validation,
        }
    }

    /// Short message suitable for direct display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { message }
            | Self::AccessRestricted { message }
            | Self::InsufficientStorage { message }
            | Self::UnsupportedOperation { message, .. }
            | Self::Remote { message, .. } => message.clone(),
            Self::Network { .. } => {
                "Could not reach the download service. Check that it is running.".to_string()
            }
            Self::InvalidResponse { .. } => "The download service sent an unexpected response".to_string(),
            Self::InvalidBaseUrl { .. } | Self::ClientBuild { .. } => self.to_string(),
        }
    }
}
