//! Canonical media shapes produced by the resolver and consumed by the
//! catalog and the job coordinator.

use serde::Serialize;

/// Descriptive metadata for one piece of media.
///
/// Platform-dependent fields are optional; absence is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub title: String,
    pub author: String,
    pub author_handle: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: u64,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub retweet_count: Option<u64>,
    pub reply_count: Option<u64>,
    pub is_private: Option<bool>,
    pub is_gif: Option<bool>,
}

/// One concrete encoded variant of the source media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenditionFormat {
    /// Identifier sent back when submitting a job.
    pub format_id: String,
    /// Quality label, e.g. `1080p` or `AUDIO_QUALITY_MEDIUM`.
    pub quality: String,
    /// Container/extension, e.g. `mp4`, `webm`, `m4a`.
    pub container: String,
    pub has_video: bool,
    pub has_audio: bool,
    pub filesize_bytes: Option<u64>,
    pub audio_bitrate_kbps: Option<u32>,
    /// Descriptive audio quality label, when the remote provides one.
    pub audio_quality: Option<String>,
}

impl RenditionFormat {
    /// Video track without audio; merge with best audio applies.
    #[must_use]
    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    /// Audio track without video; audio conversion applies.
    #[must_use]
    pub fn is_audio_only(&self) -> bool {
        !self.has_video && self.has_audio
    }
}

/// Renditions returned by the format phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatList {
    pub formats: Vec<RenditionFormat>,
    /// Remote's pick for the audio track merged into video-only downloads.
    pub preferred_audio_id: Option<String>,
}

impl FormatList {
    #[must_use]
    pub fn new(formats: Vec<RenditionFormat>) -> Self {
        Self {
            formats,
            preferred_audio_id: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }
}
