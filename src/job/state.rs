//! Job lifecycle types: state, options, the job record and emitted events.

use std::fmt;
use std::path::PathBuf;

use crate::api::StartJobRequest;
use crate::error::ErrorKind;
use crate::model::RenditionFormat;
use crate::platform::MediaReference;

/// Bitrates the backend accepts for audio conversion.
pub const SUPPORTED_AUDIO_BITRATES: [u32; 4] = [128, 192, 256, 320];

/// Default audio conversion bitrate.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 192;

pub(crate) const STAGE_DOWNLOADING: &str = "Downloading...";
pub(crate) const STAGE_PROCESSING: &str = "Processing...";
pub(crate) const STAGE_READY: &str = "Download ready!";
pub(crate) const MESSAGE_JOB_FAILED: &str = "Download failed";
pub(crate) const MESSAGE_CONNECTION_LOST: &str = "Connection lost. Please try again.";

/// Sub-state of an active job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePhase {
    Downloading,
    Processing,
}

impl ActivePhase {
    pub(crate) fn default_stage(self) -> &'static str {
        match self {
            Self::Downloading => STAGE_DOWNLOADING,
            Self::Processing => STAGE_PROCESSING,
        }
    }
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl JobFailure {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn connection_lost() -> Self {
        Self::new(ErrorKind::ConnectivityLost, MESSAGE_CONNECTION_LOST)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Lifecycle state of the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Active(ActivePhase),
    Completed,
    Failed(JobFailure),
    Cancelled,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Active(ActivePhase::Downloading) => "downloading",
            Self::Active(ActivePhase::Processing) => "processing",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// User choices that accompany a format selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOptions {
    /// Convert an audio-only rendition (to mp3).
    pub convert_to_audio_only: bool,
    /// Conversion bitrate; one of [`SUPPORTED_AUDIO_BITRATES`].
    pub audio_bitrate_kbps: u32,
    /// Merge a video-only rendition with the best audio track.
    pub merge_with_best_audio: bool,
    /// Title hint the backend may use to name the artifact.
    pub title: Option<String>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            convert_to_audio_only: false,
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            merge_with_best_audio: true,
            title: None,
        }
    }
}

impl JobOptions {
    /// Builds the job-creation body for `format`.
    ///
    /// Merge only applies to video-only renditions and conversion only to
    /// audio-only renditions; other combinations are sent as `false`.
    #[must_use]
    pub fn to_request(&self, reference: &MediaReference, format: &RenditionFormat) -> StartJobRequest {
        StartJobRequest {
            url: reference.url().to_string(),
            format_id: format.format_id.clone(),
            itag: format.format_id.clone(),
            quality: format.quality.clone(),
            convert_to_mp3: self.convert_to_audio_only && format.is_audio_only(),
            mp3_bitrate: self.audio_bitrate_kbps,
            merge_audio: self.merge_with_best_audio && format.is_video_only(),
            estimated_size: format.filesize_bytes.unwrap_or(0),
            title: self.title.clone(),
        }
    }
}

/// Whether `kbps` is accepted for audio conversion.
#[must_use]
pub fn is_supported_bitrate(kbps: u32) -> bool {
    SUPPORTED_AUDIO_BITRATES.contains(&kbps)
}

/// The submitted job as tracked by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadJob {
    pub job_id: String,
    pub reference: MediaReference,
    pub format: RenditionFormat,
    pub options: JobOptions,
    /// 0..=100, non-decreasing while active.
    pub progress_percent: f64,
    pub stage_label: String,
    /// Server-provided artifact name, once completed.
    pub filename: Option<String>,
    /// Set once the artifact sink has been invoked.
    pub transfer_triggered: bool,
    /// Local path the sink wrote to, if it saved anything.
    pub saved_to: Option<PathBuf>,
    /// Why the artifact transfer failed, if it did.
    pub transfer_error: Option<String>,
}

impl DownloadJob {
    pub(crate) fn new(
        job_id: String,
        reference: MediaReference,
        format: RenditionFormat,
        options: JobOptions,
    ) -> Self {
        Self {
            job_id,
            reference,
            format,
            options,
            progress_percent: 0.0,
            stage_label: STAGE_DOWNLOADING.to_string(),
            filename: None,
            transfer_triggered: false,
            saved_to: None,
            transfer_error: None,
        }
    }

    /// Applies a progress reading: clamped to 0..=100, never moves backwards.
    pub(crate) fn advance(&mut self, reading: Option<f64>) {
        if let Some(value) = reading.filter(|v| v.is_finite()) {
            self.progress_percent = self.progress_percent.max(value.clamp(0.0, 100.0));
        }
    }
}

/// One state change observed by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadJobEvent {
    Progress {
        phase: ActivePhase,
        percent: f64,
        stage: String,
    },
    Completed {
        job_id: String,
        filename: String,
        saved_to: Option<PathBuf>,
        transfer_error: Option<String>,
    },
    Failed(JobFailure),
    Cancelled,
}

impl DownloadJobEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn format(has_video: bool, has_audio: bool) -> RenditionFormat {
        RenditionFormat {
            format_id: "22".to_string(),
            quality: "720p".to_string(),
            container: "mp4".to_string(),
            has_video,
            has_audio,
            filesize_bytes: Some(4096),
            ..RenditionFormat::default()
        }
    }

    #[test]
    fn test_merge_only_requested_for_video_only() {
        let reference = MediaReference::parse("https://youtu.be/abc").unwrap();
        let options = JobOptions::default();
        assert!(options.to_request(&reference, &format(true, false)).merge_audio);
        assert!(!options.to_request(&reference, &format(true, true)).merge_audio);
    }

    #[test]
    fn test_conversion_only_requested_for_audio_only() {
        let reference = MediaReference::parse("https://youtu.be/abc").unwrap();
        let options = JobOptions {
            convert_to_audio_only: true,
            audio_bitrate_kbps: 320,
            ..JobOptions::default()
        };
        let request = options.to_request(&reference, &format(false, true));
        assert!(request.convert_to_mp3);
        assert_eq!(request.mp3_bitrate, 320);
        assert!(!options.to_request(&reference, &format(true, true)).convert_to_mp3);
    }

    #[test]
    fn test_request_carries_size_and_itag_alias() {
        let reference = MediaReference::parse("https://youtu.be/abc").unwrap();
        let request = JobOptions::default().to_request(&reference, &format(true, true));
        assert_eq!(request.itag, "22");
        assert_eq!(request.estimated_size, 4096);
        assert_eq!(request.url, "https://youtu.be/abc");
    }

    #[test]
    fn test_progress_is_clamped_and_monotonic() {
        let reference = MediaReference::parse("https://youtu.be/abc").unwrap();
        let mut job = DownloadJob::new("d1".to_string(), reference, format(true, true), JobOptions::default());
        job.advance(Some(40.0));
        job.advance(Some(10.0));
        assert!((job.progress_percent - 40.0).abs() < f64::EPSILON);
        job.advance(Some(250.0));
        assert!((job.progress_percent - 100.0).abs() < f64::EPSILON);
        job.advance(Some(f64::NAN));
        job.advance(None);
        assert!((job.progress_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_supported_bitrates() {
        assert!(is_supported_bitrate(192));
        assert!(!is_supported_bitrate(64));
    }

    #[test]
    fn test_state_labels_and_terminality() {
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Active(ActivePhase::Processing).is_terminal());
        assert_eq!(JobState::Active(ActivePhase::Processing).label(), "processing");
        assert!(DownloadJobEvent::Cancelled.is_terminal());
    }
}
