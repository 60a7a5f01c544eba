//! Clipfetch Core Library
//!
//! Client side of a media-download service: classifies media URLs,
//! fetches metadata and renditions from the extraction service, tracks a
//! download job over its server-sent progress stream and saves the
//! finished artifact.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`platform`] - URL classification and validated media references
//! - [`api`] - HTTP client for the extraction service and its SSE stream
//! - [`resolver`] - Two-phase metadata/format lookup
//! - [`catalog`] - Format filtering, default selection and display helpers
//! - [`job`] - Download-job state machine and artifact transfer
//! - [`health`] - Periodic service health polling

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod catalog;
pub mod error;
pub mod health;
pub mod job;
pub mod model;
pub mod platform;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, DEFAULT_API_BASE_URL, HttpSettings, RequestPhase};
pub use catalog::FormatAxis;
pub use error::ErrorKind;
pub use health::{DEFAULT_HEALTH_INTERVAL, HealthMonitor, HealthStatus, HealthTask, SharedHealth};
pub use job::{
    ActivePhase, ArtifactSink, DEFAULT_AUDIO_BITRATE_KBPS, DirectorySink, DownloadJob,
    DownloadJobCoordinator, DownloadJobEvent, JobError, JobFailure, JobOptions, JobOutcome, JobState,
    SUPPORTED_AUDIO_BITRATES, is_supported_bitrate,
};
pub use model::{FormatList, MediaMetadata, RenditionFormat};
pub use platform::{MediaReference, Platform, ValidationError, classify};
pub use resolver::{FormatsState, InfoResolver, ResolveError, ResolvedMedia};
