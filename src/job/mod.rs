//! Download-job lifecycle: submission, progress consumption and artifact
//! transfer.
//!
//! # Architecture
//!
//! - [`DownloadJobCoordinator`] - state machine owning the progress channel
//! - [`JobBackend`] - remote job operations (implemented by [`crate::api::ApiClient`])
//! - [`ArtifactSink`] - where finished artifacts go ([`DirectorySink`], [`RecordingSink`])
//! - [`ChannelSlot`] - holds at most one open [`ProgressChannel`]

mod backend;
mod channel;
mod coordinator;
mod error;
mod state;
mod transfer;

pub use backend::JobBackend;
pub use channel::{ChannelSlot, ProgressChannel};
pub use coordinator::{DownloadJobCoordinator, JobOutcome};
pub use error::JobError;
pub use state::{
    ActivePhase, DEFAULT_AUDIO_BITRATE_KBPS, DownloadJob, DownloadJobEvent, JobFailure, JobOptions,
    JobState, SUPPORTED_AUDIO_BITRATES, is_supported_bitrate,
};
pub use transfer::{Artifact, ArtifactSink, DirectorySink, RecordingSink, TransferError};
