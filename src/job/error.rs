//! Error types for the job coordinator.

use thiserror::Error;

use crate::api::ApiError;
use crate::error::ErrorKind;

use super::JobFailure;

/// Errors surfaced by [`super::DownloadJobCoordinator`].
#[derive(Debug, Error)]
pub enum JobError {
    /// `submit` was called without a chosen format. Nothing was sent.
    #[error("please select a format\n  Suggestion: Run `clipfetch formats <url>` to list available formats")]
    NoFormatSelected,

    /// Job creation or channel setup was rejected or failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The progress channel dropped before a terminal event.
    #[error("{message}")]
    ConnectivityLost {
        /// Message shown to the user.
        message: String,
    },

    /// The job failed remotely, or was recorded as failed at submission.
    #[error("download job failed: {message}")]
    JobFailed {
        /// Classification of the failure; `JobFailed` for remote errors.
        kind: ErrorKind,
        /// Server-provided or default message.
        message: String,
    },

    /// There is no submitted job to drive.
    #[error("no download job has been submitted")]
    NotSubmitted,
}

impl JobError {
    /// Flat classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoFormatSelected | Self::NotSubmitted => ErrorKind::Validation,
            Self::Api(error) => error.kind(),
            Self::ConnectivityLost { .. } => ErrorKind::ConnectivityLost,
            Self::JobFailed { kind, .. } => *kind,
        }
    }

    /// Short message suitable for direct display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoFormatSelected => "Please select a format".to_string(),
            Self::Api(error) => error.user_message(),
            Self::ConnectivityLost { message } | Self::JobFailed { message, .. } => {
                message.clone()
            }
            Self::NotSubmitted => self.to_string(),
        }
    }

    /// Converts a failure recorded during streaming into an error.
    pub(crate) fn from_failure(failure: JobFailure) -> Self {
        match failure.kind {
            ErrorKind::ConnectivityLost => Self::ConnectivityLost {
                message: failure.message,
            },
            kind => Self::JobFailed {
                kind,
                message: failure.message,
            },
        }
    }

    /// The failure recorded in state for this error.
    pub(crate) fn to_failure(&self) -> JobFailure {
        JobFailure::new(self.kind(), self.user_message())
    }
}
