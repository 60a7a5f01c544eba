use async_trait::async_trait;

use crate::api::{ApiClient, ApiError, ProgressStream, StartJobRequest};
use crate::platform::Platform;

/// Remote operations the coordinator depends on.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Creates a job and returns its id.
    async fn start_job(&self, platform: Platform, request: &StartJobRequest) -> Result<String, ApiError>;

    /// Opens the progress channel for `job_id`.
    async fn open_progress(&self, job_id: &str) -> Result<ProgressStream, ApiError>;

    /// Retrieval URL for a finished artifact.
    fn artifact_url(&self, job_id: &str, filename: &str) -> String;
}

#[async_trait]
impl JobBackend for ApiClient {
    async fn start_job(&self, platform: Platform, request: &StartJobRequest) -> Result<String, ApiError> {
        ApiClient::start_job(self, platform, request).await
    }

    async fn open_progress(&self, job_id: &str) -> Result<ProgressStream, ApiError> {
        self.open_progress_stream(job_id).await
    }

    fn artifact_url(&self, job_id: &str, filename: &str) -> String {
        ApiClient::artifact_url(self, job_id, filename)
    }
}
