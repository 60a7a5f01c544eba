//! Error classification shared across the resolver, job and health paths.
//!
//! Each module owns its own `thiserror` enum; [`ErrorKind`] is the flat
//! taxonomy those errors map into so hosts can branch on the class of a
//! failure without matching every variant.

/// Classification of a failure surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or unsupported URL, or no format chosen. Never reaches the remote.
    Validation,
    /// The remote found no resolvable media.
    NotFound,
    /// The content needs elevated credentials (cookies).
    AccessRestricted,
    /// The remote ran out of disk space.
    InsufficientStorage,
    /// The remote does not expose the route. Shown verbatim.
    UnsupportedOperation,
    /// Any other non-2xx response.
    Remote,
    /// Transport failure on a request/response call.
    Network,
    /// The progress channel dropped mid-stream.
    ConnectivityLost,
    /// The remote job reported an error event.
    JobFailed,
}

impl ErrorKind {
    /// Short label for log fields and terminal output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not-found",
            Self::AccessRestricted => "access-restricted",
            Self::InsufficientStorage => "insufficient-storage",
            Self::UnsupportedOperation => "unsupported-operation",
            Self::Remote => "remote",
            Self::Network => "network",
            Self::ConnectivityLost => "connectivity-lost",
            Self::JobFailed => "job-failed",
        }
    }

    /// Whether the error came from local checks rather than the remote.
    #[must_use]
    pub fn is_local(self) -> bool {
        matches!(self, Self::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_local() {
        assert!(ErrorKind::Validation.is_local());
        assert!(!ErrorKind::Network.is_local());
        assert!(!ErrorKind::ConnectivityLost.is_local());
    }

    #[test]
    fn test_labels_are_kebab_case() {
        assert_eq!(ErrorKind::InsufficientStorage.label(), "insufficient-storage");
        assert_eq!(ErrorKind::UnsupportedOperation.label(), "unsupported-operation");
    }
}
