//! The download-job state machine.
//!
//! ```text
//! Idle -> Submitting -> Active(Downloading|Processing) -> Completed
//!                    \                                \-> Failed
//!                     \-> Failed
//! Submitting | Active -> Cancelled
//! ```
//!
//! The coordinator owns the only progress channel. Every path out of
//! `Active` closes it, as does a new `submit`, `cancel` and `Drop`.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::{Stream, stream};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ProgressEvent, ProgressStatus};
use crate::error::ErrorKind;
use crate::health::SharedHealth;
use crate::model::RenditionFormat;
use crate::platform::MediaReference;

use super::backend::JobBackend;
use super::channel::{ChannelSlot, ProgressChannel};
use super::error::JobError;
use super::state::{
    ActivePhase, DownloadJob, DownloadJobEvent, JobFailure, JobOptions, JobState,
    MESSAGE_JOB_FAILED, STAGE_READY,
};
use super::transfer::{Artifact, ArtifactSink};

/// How a driven job ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed {
        job_id: String,
        filename: String,
        saved_to: Option<PathBuf>,
        transfer_error: Option<String>,
    },
    Cancelled,
}

/// Recorded when a save was dropped before it finished.
const TRANSFER_INTERRUPTED: &str = "artifact transfer was interrupted";

/// What reading the channel produced.
enum Step {
    Event(DownloadJobEvent),
    /// The job finished remotely; its artifact still has to be saved.
    Transfer(Artifact),
}

/// Drives one download job at a time from submission to a terminal state.
pub struct DownloadJobCoordinator {
    backend: Arc<dyn JobBackend>,
    sink: Arc<dyn ArtifactSink>,
    health: Option<SharedHealth>,
    state: JobState,
    job: Option<DownloadJob>,
    channel: ChannelSlot,
}

impl DownloadJobCoordinator {
    #[must_use]
    pub fn new(backend: Arc<dyn JobBackend>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            backend,
            sink,
            health: None,
            state: JobState::Idle,
            job: None,
            channel: ChannelSlot::default(),
        }
    }

    /// Disk-space rejections are also written to `health`.
    #[must_use]
    pub fn with_health(mut self, health: SharedHealth) -> Self {
        self.health = Some(health);
        self
    }

    #[must_use]
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// The current (or last) job, once submission succeeded.
    #[must_use]
    pub fn job(&self) -> Option<&DownloadJob> {
        self.job.as_ref()
    }

    #[must_use]
    pub fn has_open_channel(&self) -> bool {
        self.channel.is_open()
    }

    /// Submits a job for `format` and opens its progress channel.
    ///
    /// Any channel left over from a previous job is closed first.
    ///
    /// # Errors
    ///
    /// - [`JobError::NoFormatSelected`] when `format` is `None`; nothing is
    ///   sent and the state is unchanged.
    /// - [`JobError::Api`] when job creation or channel setup fails; the
    ///   state becomes `Failed` and no channel is left open.
    pub async fn submit(
        &mut self,
        reference: &MediaReference,
        format: Option<&RenditionFormat>,
        options: JobOptions,
    ) -> Result<String, JobError> {
        let Some(format) = format else {
            return Err(JobError::NoFormatSelected);
        };

        self.channel.close();
        self.job = None;
        self.transition(JobState::Submitting);

        let request = options.to_request(reference, format);
        info!(
            url = reference.url(),
            platform = %reference.platform(),
            format_id = %format.format_id,
            merge_audio = request.merge_audio,
            convert_to_mp3 = request.convert_to_mp3,
            "submitting download job"
        );

        let job_id = match self.backend.start_job(reference.platform(), &request).await {
            Ok(job_id) => job_id,
            Err(error) => return Err(self.fail_submission(error)),
        };
        let stream = match self.backend.open_progress(&job_id).await {
            Ok(stream) => stream,
            Err(error) => return Err(self.fail_submission(error)),
        };

        self.channel.replace(ProgressChannel::new(job_id.clone(), stream));
        self.job = Some(DownloadJob::new(
            job_id.clone(),
            reference.clone(),
            format.clone(),
            options,
        ));
        self.transition(JobState::Active(ActivePhase::Downloading));
        info!(job_id = %job_id, "download job started");
        Ok(job_id)
    }

    fn fail_submission(&mut self, error: ApiError) -> JobError {
        if let ApiError::InsufficientStorage { message } = &error
            && let Some(health) = &self.health
        {
            health.set_disk_space_warning(message.clone());
        }
        let error = JobError::from(error);
        warn!(kind = error.kind().label(), error = %error, "download job rejected");
        self.channel.close();
        self.transition(JobState::Failed(error.to_failure()));
        error
    }

    /// Waits for and applies the next channel event.
    ///
    /// Returns `None` when no job is active. Exactly one terminal event is
    /// returned per job. A completed job's artifact is saved before the
    /// `Completed` event is returned.
    pub async fn next_event(&mut self) -> Option<DownloadJobEvent> {
        match self.next_step().await? {
            Step::Event(event) => Some(event),
            Step::Transfer(artifact) => Some(self.finish_transfer(artifact).await),
        }
    }

    async fn next_step(&mut self) -> Option<Step> {
        loop {
            if !self.state.is_active() {
                return None;
            }
            let Some(channel) = self.channel.current_mut() else {
                if self.job.as_ref().is_some_and(|job| job.transfer_triggered) {
                    warn!("artifact transfer was interrupted");
                    if let Some(job) = self.job.as_mut()
                        && job.transfer_error.is_none()
                    {
                        job.transfer_error = Some(TRANSFER_INTERRUPTED.to_string());
                    }
                    return Some(Step::Event(self.finish_completion()));
                }
                return Some(Step::Event(self.fail(JobFailure::connection_lost())));
            };
            match channel.next().await {
                Some(Ok(event)) => {
                    if let Some(step) = self.apply(event) {
                        return Some(step);
                    }
                }
                Some(Err(error)) => {
                    warn!(error = %error, "progress channel failed");
                    return Some(Step::Event(self.fail(JobFailure::connection_lost())));
                }
                None => {
                    warn!("progress channel closed before a terminal event");
                    return Some(Step::Event(self.fail(JobFailure::connection_lost())));
                }
            }
        }
    }

    fn apply(&mut self, event: ProgressEvent) -> Option<Step> {
        match event.status {
            ProgressStatus::Downloading => Some(Step::Event(
                self.progress(ActivePhase::Downloading, &event),
            )),
            ProgressStatus::Processing => Some(Step::Event(
                self.progress(ActivePhase::Processing, &event),
            )),
            ProgressStatus::Completed => Some(self.begin_completion(event.filename)),
            ProgressStatus::Error => {
                let message = event
                    .message
                    .unwrap_or_else(|| MESSAGE_JOB_FAILED.to_string());
                Some(Step::Event(
                    self.fail(JobFailure::new(ErrorKind::JobFailed, message)),
                ))
            }
            ProgressStatus::Other(status) => {
                debug!(status = %status, "ignoring unknown progress status");
                None
            }
        }
    }

    fn progress(&mut self, phase: ActivePhase, event: &ProgressEvent) -> DownloadJobEvent {
        if self.state != JobState::Active(phase) {
            self.transition(JobState::Active(phase));
        }
        let stage = event
            .stage
            .clone()
            .unwrap_or_else(|| phase.default_stage().to_string());
        let percent = match self.job.as_mut() {
            Some(job) => {
                job.advance(event.progress);
                job.stage_label.clone_from(&stage);
                job.progress_percent
            }
            None => 0.0,
        };
        DownloadJobEvent::Progress {
            phase,
            percent,
            stage,
        }
    }

    /// Closes the channel and names the artifact. The job stays active
    /// until the artifact has been handed to the sink.
    fn begin_completion(&mut self, filename: Option<String>) -> Step {
        self.channel.close();
        let Some(job) = self.job.as_mut() else {
            return Step::Event(self.fail(JobFailure::connection_lost()));
        };
        job.progress_percent = 100.0;
        job.stage_label = STAGE_READY.to_string();

        let filename = filename.unwrap_or_else(|| fallback_filename(job));
        job.filename = Some(filename.clone());
        if job.transfer_triggered {
            return Step::Event(self.finish_completion());
        }
        job.transfer_triggered = true;
        Step::Transfer(Artifact {
            job_id: job.job_id.clone(),
            url: self.backend.artifact_url(&job.job_id, &filename),
            filename,
        })
    }

    async fn finish_transfer(&mut self, artifact: Artifact) -> DownloadJobEvent {
        let sink = Arc::clone(&self.sink);
        let result = sink.save(&artifact).await;
        if let Some(job) = self.job.as_mut() {
            match result {
                Ok(saved_to) => job.saved_to = saved_to,
                Err(error) => {
                    warn!(error = %error, url = %artifact.url, "artifact transfer failed");
                    job.transfer_error = Some(error.to_string());
                }
            }
        }
        self.finish_completion()
    }

    fn finish_completion(&mut self) -> DownloadJobEvent {
        let Some(job) = self.job.as_ref() else {
            return self.fail(JobFailure::connection_lost());
        };
        let event = DownloadJobEvent::Completed {
            job_id: job.job_id.clone(),
            filename: job.filename.clone().unwrap_or_default(),
            saved_to: job.saved_to.clone(),
            transfer_error: job.transfer_error.clone(),
        };
        info!(job_id = %job.job_id, "download job completed");
        self.transition(JobState::Completed);
        event
    }

    fn fail(&mut self, failure: JobFailure) -> DownloadJobEvent {
        self.channel.close();
        warn!(kind = failure.kind.label(), message = %failure.message, "download job failed");
        self.transition(JobState::Failed(failure.clone()));
        DownloadJobEvent::Failed(failure)
    }

    /// All remaining events of the current job, ending after the terminal one.
    ///
    /// Restartable: after a new `submit` it yields that job's events.
    pub fn events(&mut self) -> impl Stream<Item = DownloadJobEvent> + '_ {
        stream::unfold(self, |coordinator| async move {
            let event = coordinator.next_event().await?;
            Some((event, coordinator))
        })
    }

    /// Pumps events into `observer` until the job ends or `shutdown`
    /// resolves, in which case the job is cancelled.
    ///
    /// Once the server reports completion the artifact save runs to the end;
    /// `shutdown` is no longer observed.
    ///
    /// # Errors
    ///
    /// [`JobError::ConnectivityLost`] or [`JobError::JobFailed`] when the job
    /// failed, [`JobError::NotSubmitted`] when no job was started.
    pub async fn drive<F, O>(&mut self, shutdown: F, mut observer: O) -> Result<JobOutcome, JobError>
    where
        F: Future<Output = ()>,
        O: FnMut(&DownloadJobEvent),
    {
        tokio::pin!(shutdown);
        while self.state.is_active() {
            let step = tokio::select! {
                biased;
                () = &mut shutdown => self.cancel().map(Step::Event),
                step = self.next_step() => step,
            };
            let event = match step {
                Some(Step::Event(event)) => event,
                Some(Step::Transfer(artifact)) => self.finish_transfer(artifact).await,
                None => continue,
            };
            observer(&event);
        }
        self.outcome()
    }

    fn outcome(&self) -> Result<JobOutcome, JobError> {
        match (&self.state, &self.job) {
            (JobState::Completed, Some(job)) => Ok(JobOutcome::Completed {
                job_id: job.job_id.clone(),
                filename: job.filename.clone().unwrap_or_default(),
                saved_to: job.saved_to.clone(),
                transfer_error: job.transfer_error.clone(),
            }),
            (JobState::Cancelled, _) => Ok(JobOutcome::Cancelled),
            (JobState::Failed(failure), _) => Err(JobError::from_failure(failure.clone())),
            _ => Err(JobError::NotSubmitted),
        }
    }

    /// Closes the channel; from `Submitting` or `Active` moves to
    /// `Cancelled` and returns the single `Cancelled` event.
    ///
    /// Idempotent and safe in any state.
    pub fn cancel(&mut self) -> Option<DownloadJobEvent> {
        self.channel.close();
        if matches!(self.state, JobState::Submitting | JobState::Active(_)) {
            info!(
                job_id = self.job.as_ref().map_or("", |job| job.job_id.as_str()),
                "download job cancelled"
            );
            self.transition(JobState::Cancelled);
            return Some(DownloadJobEvent::Cancelled);
        }
        None
    }

    fn transition(&mut self, next: JobState) {
        debug!(from = self.state.label(), to = next.label(), "job state");
        self.state = next;
    }
}

impl Drop for DownloadJobCoordinator {
    fn drop(&mut self) {
        if self.channel.close() {
            debug!("progress channel closed on teardown");
        }
    }
}

impl std::fmt::Debug for DownloadJobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadJobCoordinator")
            .field("state", &self.state)
            .field("job", &self.job)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

fn fallback_filename(job: &DownloadJob) -> String {
    let ext = if job.format.container.is_empty() {
        "bin"
    } else {
        job.format.container.as_str()
    };
    format!("{}.{ext}", job.job_id)
}
