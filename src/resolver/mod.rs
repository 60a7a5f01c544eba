//! Media resolution: the metadata phase and the format phase.
//!
//! Two-phase platforms (YouTube) answer metadata first and formats on a
//! second call; every other platform returns both from one info call. Either
//! way the caller ends up with a [`ResolvedMedia`] whose formats are
//! tracked separately in [`FormatsState`], so a failed format phase never
//! costs the metadata.
//!
//! # Example
//!
//! ```no_run
//! use clipfetch_core::api::{ApiClient, HttpSettings};
//! use clipfetch_core::resolver::InfoResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiClient::new("http://127.0.0.1:5000/api", HttpSettings::default())?;
//! let resolver = InfoResolver::new(api);
//! let media = resolver.resolve_input("https://youtu.be/dQw4w9WgXcQ").await?;
//! println!("{} ({:?})", media.metadata.title, media.formats);
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ResolveError;

use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::model::{FormatList, MediaMetadata};
use crate::platform::MediaReference;

/// Load state of the format list attached to resolved media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormatsState {
    /// The format phase has not completed yet.
    #[default]
    Pending,
    /// Formats arrived; the list may legitimately be empty.
    Loaded(FormatList),
    /// The format phase failed with this message; retry is allowed.
    Failed(String),
}

impl FormatsState {
    /// The loaded list, if any.
    #[must_use]
    pub fn list(&self) -> Option<&FormatList> {
        match self {
            Self::Loaded(list) => Some(list),
            Self::Pending | Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Metadata plus format state for one validated reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub reference: MediaReference,
    pub metadata: MediaMetadata,
    pub formats: FormatsState,
}

impl ResolvedMedia {
    /// Replaces the format state wholesale. Metadata is left untouched.
    pub fn merge_formats(&mut self, formats: FormatsState) {
        self.formats = formats;
    }
}

/// Runs lookups against the extraction service.
#[derive(Debug, Clone)]
pub struct InfoResolver {
    api: ApiClient,
}

impl InfoResolver {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Runs the metadata phase.
    ///
    /// Single-call platforms come back with [`FormatsState::Loaded`];
    /// two-phase platforms with [`FormatsState::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Api`] classified as not-found, access
    /// restricted, unsupported operation, remote or network.
    #[instrument(skip(self), fields(url = reference.url(), platform = %reference.platform()))]
    pub async fn fetch_metadata(
        &self,
        reference: &MediaReference,
    ) -> Result<ResolvedMedia, ResolveError> {
        let (metadata, inline_formats) = self.api.fetch_metadata(reference).await?;
        let formats = inline_formats.map_or(FormatsState::Pending, FormatsState::Loaded);
        debug!(title = %metadata.title, pending = formats.is_pending(), "metadata resolved");
        Ok(ResolvedMedia {
            reference: reference.clone(),
            metadata,
            formats,
        })
    }

    /// Runs the format phase.
    ///
    /// # Errors
    ///
    /// Same classification as [`InfoResolver::fetch_metadata`].
    #[instrument(skip(self), fields(url = reference.url(), platform = %reference.platform()))]
    pub async fn fetch_formats(&self, reference: &MediaReference) -> Result<FormatList, ResolveError> {
        let list = self.api.fetch_formats(reference).await?;
        debug!(count = list.len(), "formats resolved");
        Ok(list)
    }

    /// Runs the format phase for `media` and merges the outcome.
    ///
    /// On failure the state becomes [`FormatsState::Failed`] and the error is
    /// returned; calling again retries.
    ///
    /// # Errors
    ///
    /// The error from [`InfoResolver::fetch_formats`].
    pub async fn load_formats(&self, media: &mut ResolvedMedia) -> Result<(), ResolveError> {
        match self.fetch_formats(&media.reference).await {
            Ok(list) => {
                media.merge_formats(FormatsState::Loaded(list));
                Ok(())
            }
            Err(error) => {
                media.merge_formats(FormatsState::Failed(error.user_message()));
                Err(error)
            }
        }
    }

    /// Metadata phase then, if still pending, the format phase.
    ///
    /// A format failure is recorded in the returned media rather than
    /// returned, so the metadata stays usable.
    ///
    /// # Errors
    ///
    /// Only metadata-phase errors are returned.
    pub async fn resolve(&self, reference: &MediaReference) -> Result<ResolvedMedia, ResolveError> {
        let mut media = self.fetch_metadata(reference).await?;
        if media.formats.is_pending()
            && let Err(error) = self.load_formats(&mut media).await
        {
            warn!(error = %error, "format lookup failed; metadata kept");
        }
        info!(
            title = %media.metadata.title,
            platform = %reference.platform(),
            formats = media.formats.list().map_or(0, FormatList::len),
            "media resolved"
        );
        Ok(media)
    }

    /// Validates `input` and resolves it.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Validation`] before any request, otherwise as
    /// [`InfoResolver::resolve`].
    pub async fn resolve_input(&self, input: &str) -> Result<ResolvedMedia, ResolveError> {
        let reference = MediaReference::parse(input)?;
        self.resolve(&reference).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::RenditionFormat;

    fn media() -> ResolvedMedia {
        ResolvedMedia {
            reference: MediaReference::parse("https://youtu.be/abc").unwrap(),
            metadata: MediaMetadata {
                title: "Clip".to_string(),
                ..MediaMetadata::default()
            },
            formats: FormatsState::Pending,
        }
    }

    #[test]
    fn test_pending_is_distinct_from_empty() {
        let empty = FormatsState::Loaded(FormatList::default());
        assert!(FormatsState::Pending.list().is_none());
        assert!(empty.list().is_some_and(FormatList::is_empty));
        assert_ne!(FormatsState::Pending, empty);
    }

    #[test]
    fn test_merge_formats_keeps_metadata() {
        let mut media = media();
        media.merge_formats(FormatsState::Failed("boom".to_string()));
        assert_eq!(media.metadata.title, "Clip");

        let list = FormatList::new(vec![RenditionFormat {
            format_id: "22".to_string(),
            ..RenditionFormat::default()
        }]);
        media.merge_formats(FormatsState::Loaded(list.clone()));
        assert_eq!(media.formats.list(), Some(&list));
        assert_eq!(media.metadata.title, "Clip");
    }

    #[test]
    fn test_resolve_input_rejects_locally() {
        let api = ApiClient::new("http://127.0.0.1:9/api", crate::api::HttpSettings::default()).unwrap();
        let resolver = InfoResolver::new(api);
        let error = tokio_test::block_on(resolver.resolve_input("   ")).unwrap_err();
        assert!(matches!(error, ResolveError::Validation(_)));
        let error =
            tokio_test::block_on(resolver.resolve_input("https://example.com/video.mp4")).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Validation);
    }
}
